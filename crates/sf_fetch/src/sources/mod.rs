use async_trait::async_trait;
use sf_core::{FeedArticle, Result};

pub mod newsapi;

pub use newsapi::{NewsApiConfig, NewsApiSource};

/// A remote feed that yields one bounded batch of raw articles per call.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Returns the name of the news source
    fn name(&self) -> &str;

    /// Fetches the current batch. Fails without side effects on a non-success response.
    async fn fetch_articles(&self) -> Result<Vec<FeedArticle>>;
}
