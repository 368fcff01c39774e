pub mod error;
pub mod feed;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use feed::{ArticleSubmission, FeedArticle, FeedResponse, FeedSourceRef};
pub use storage::ArticleStorage;
pub use types::{Article, ArticleStatus, StoredArticle};
