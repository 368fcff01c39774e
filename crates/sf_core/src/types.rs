use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A news article in its normalized, storable shape.
///
/// `url` is the natural key: a store holds at most one article per url.
/// Optional fields are serialized as explicit `null` rather than omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub source: String,
    pub author: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
}

impl Article {
    /// Checks the fields synchronization depends on. Only the key is required.
    ///
    /// The url is used as stored; normalization from feed records and submissions trims
    /// it, so a whitespace-only url is rejected here as blank.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::InvalidArticle("article url is missing".to_string()));
        }
        Ok(())
    }
}

/// An article as read back from a store, with the store's identifier as a plain string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArticle {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub article: Article,
}

/// What an upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    /// No article with this url existed; one was inserted.
    New,
    /// An article with this url existed and at least one field changed.
    Updated,
    /// An article with this url existed with identical fields.
    Unchanged,
}

impl ArticleStatus {
    pub fn is_changed(&self) -> bool {
        !matches!(self, ArticleStatus::Unchanged)
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ArticleStatus::New => "🆕",
            ArticleStatus::Updated => "📝",
            ArticleStatus::Unchanged => "⏭️",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArticleStatus::New => "new",
            ArticleStatus::Updated => "updated",
            ArticleStatus::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}
