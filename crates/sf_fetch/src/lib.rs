pub mod ingestor;
pub mod logging;
pub mod sources;

pub use ingestor::{IngestReport, Ingestor};
pub use logging::{init_logging, Logger};
pub use sources::{FeedSource, NewsApiConfig, NewsApiSource};

