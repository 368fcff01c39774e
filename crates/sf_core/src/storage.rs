use async_trait::async_trait;

use crate::types::{Article, ArticleStatus, StoredArticle};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Insert the article, or replace every field of the stored article with the same url.
    ///
    /// Exactly one record is created or updated. Reports `Unchanged` when the stored
    /// fields already equal the incoming ones.
    async fn upsert_article(&self, article: &Article) -> Result<ArticleStatus>;

    /// Every stored article, unfiltered and unpaginated.
    async fn list_articles(&self) -> Result<Vec<StoredArticle>>;

    /// Look up a single article by its url.
    async fn get_by_url(&self, url: &str) -> Result<Option<StoredArticle>>;

    /// Number of stored articles.
    async fn count_articles(&self) -> Result<u64>;
}
