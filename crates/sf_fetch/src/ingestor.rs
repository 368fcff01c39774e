use serde::Serialize;
use sf_core::{Article, ArticleStatus, ArticleStorage, ArticleSubmission, Result, StoredArticle};
use std::sync::Arc;

use crate::logging::Logger;
use crate::sources::FeedSource;

/// Outcome of one bulk ingestion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Records returned by the feed, whether or not they changed the store.
    pub fetched: usize,
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Records dropped before synchronization because they had no url.
    pub skipped: usize,
}

impl IngestReport {
    fn record(&mut self, status: ArticleStatus) {
        match status {
            ArticleStatus::New => self.new += 1,
            ArticleStatus::Updated => self.updated += 1,
            ArticleStatus::Unchanged => self.unchanged += 1,
        }
    }
}

/// Pulls articles from a feed and keeps the store in sync with them, keyed by url.
pub struct Ingestor {
    storage: Arc<dyn ArticleStorage>,
    source: Arc<dyn FeedSource>,
    logger: Logger,
}

impl Ingestor {
    pub fn new(storage: Arc<dyn ArticleStorage>, source: Arc<dyn FeedSource>) -> Self {
        let logger = Logger::new().with_prefix(format!("[{}]", source.name()));
        Self {
            storage,
            source,
            logger,
        }
    }

    pub fn storage(&self) -> &Arc<dyn ArticleStorage> {
        &self.storage
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Fetch one batch and upsert every record in the order received.
    ///
    /// A fetch failure returns before anything is written. A store failure aborts the
    /// remaining records; those already written stay written.
    pub async fn ingest(&self) -> Result<IngestReport> {
        self.logger.info("🦗 Fetching articles");
        let batch = match self.source.fetch_articles().await {
            Ok(batch) => batch,
            Err(e) => {
                self.logger.error(&format!("Failed to fetch articles: {}", e));
                return Err(e);
            }
        };

        let mut report = IngestReport {
            fetched: batch.len(),
            ..Default::default()
        };
        self.logger.info(&format!("📰 Fetched {} articles", batch.len()));

        for raw in batch {
            let article = Article::from(raw);
            if let Err(e) = article.validate() {
                self.logger.warn(&format!("Skipping article {:?}: {}", article.title, e));
                report.skipped += 1;
                continue;
            }
            let status = self.storage.upsert_article(&article).await?;
            self.logger.debug(&format!("{} {}", status.emoji(), article.url));
            report.record(status);
        }

        self.logger.info(&format!(
            "✅ Stored {} articles ({} new, {} updated, {} unchanged, {} skipped)",
            report.fetched, report.new, report.updated, report.unchanged, report.skipped
        ));
        Ok(report)
    }

    /// Normalize and upsert a single client-supplied article.
    pub async fn submit(&self, submission: ArticleSubmission) -> Result<ArticleStatus> {
        let article = Article::from(submission);
        article.validate()?;
        let status = self.storage.upsert_article(&article).await?;
        self.logger.info(&format!("{} {} ({})", status.emoji(), article.url, status));
        Ok(status)
    }

    pub async fn list(&self) -> Result<Vec<StoredArticle>> {
        self.storage.list_articles().await
    }
}
