//! Loosely shaped inputs and their normalization into [`Article`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Article;

/// Body of a NewsAPI-style `everything` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Vec<FeedArticle>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedSourceRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One article as the remote feed sends it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedArticle {
    #[serde(default)]
    pub source: Option<FeedSourceRef>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// A single article posted directly by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSubmission {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    pub source: String,
    pub published_date: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

fn parse_published_at(raw: Option<String>, url: &str) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(date) => Some(date.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!("Dropping unparsable publishedAt {:?} for {}: {}", raw, url, e);
            None
        }
    }
}

impl From<FeedArticle> for Article {
    fn from(raw: FeedArticle) -> Self {
        let url = raw.url.map(|u| u.trim().to_string()).unwrap_or_default();
        let published_at = parse_published_at(raw.published_at, &url);
        Article {
            url,
            title: raw.title,
            description: raw.description,
            source: raw.source.and_then(|s| s.name).unwrap_or_default(),
            author: raw.author,
            image_url: raw.url_to_image,
            published_at,
            content: raw.content,
        }
    }
}

impl From<ArticleSubmission> for Article {
    fn from(submission: ArticleSubmission) -> Self {
        Article {
            url: submission.url.trim().to_string(),
            title: Some(submission.title),
            description: submission.description,
            source: submission.source,
            author: submission.author,
            image_url: submission.image_url,
            published_at: Some(submission.published_date),
            content: submission.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_feed_article_normalization() {
        let body = r#"{
            "status": "ok",
            "totalResults": 1,
            "articles": [{
                "source": {"id": null, "name": "BBC Sport"},
                "author": "Jane Doe",
                "title": "Cup final preview",
                "description": null,
                "url": "https://bbc.example/cup",
                "urlToImage": "https://bbc.example/cup.jpg",
                "publishedAt": "2024-05-01T12:30:00Z",
                "content": "Both sides..."
            }]
        }"#;
        let response: FeedResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.total_results, Some(1));

        let article = Article::from(response.articles[0].clone());
        assert_eq!(article.url, "https://bbc.example/cup");
        assert_eq!(article.source, "BBC Sport");
        assert_eq!(article.image_url.as_deref(), Some("https://bbc.example/cup.jpg"));
        assert_eq!(
            article.published_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap())
        );
        assert_eq!(article.description, None);
    }

    #[test]
    fn test_missing_fields_become_absent() {
        let raw: FeedArticle = serde_json::from_str(r#"{"source": {}}"#).unwrap();
        let article = Article::from(raw);
        assert_eq!(article.url, "");
        assert_eq!(article.source, "");
        assert!(article.title.is_none());
        assert!(article.validate().is_err());
    }

    #[test]
    fn test_null_source_does_not_reject_batch() {
        let body = r#"{"articles": [
            {"source": {"id": null, "name": null}, "url": "https://a/1"},
            {"source": null, "url": "https://a/2"},
            {"source": {"name": "ok"}, "url": "https://a/3", "title": "Three"}
        ]}"#;
        let response: FeedResponse = serde_json::from_str(body).unwrap();
        let articles: Vec<Article> = response.articles.into_iter().map(Article::from).collect();
        assert_eq!(articles.len(), 3);
        assert_eq!(articles[0].source, "");
        assert_eq!(articles[1].source, "");
        assert_eq!(articles[2].source, "ok");
    }

    #[test]
    fn test_url_is_trimmed() {
        let raw = FeedArticle {
            url: Some("  https://a/1\n".to_string()),
            ..Default::default()
        };
        assert_eq!(Article::from(raw).url, "https://a/1");
    }

    #[test]
    fn test_unparsable_date_is_dropped() {
        let raw = FeedArticle {
            url: Some("https://a/1".to_string()),
            published_at: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(Article::from(raw).published_at.is_none());
    }

    #[test]
    fn test_missing_articles_list_is_empty_batch() {
        let response: FeedResponse = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
        assert!(response.articles.is_empty());
    }

    #[test]
    fn test_submission_normalization() {
        let body = r#"{
            "title": "Transfer news",
            "url": "https://a/2",
            "source": "Local Paper",
            "published_date": "2024-06-01T08:00:00+02:00"
        }"#;
        let submission: ArticleSubmission = serde_json::from_str(body).unwrap();
        let article = Article::from(submission);
        assert_eq!(article.title.as_deref(), Some("Transfer news"));
        assert_eq!(
            article.published_at,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 6, 0, 0).unwrap())
        );
        assert!(article.content.is_none());
    }

    #[test]
    fn test_submission_requires_title() {
        let body = r#"{"url": "https://a/2", "source": "x", "published_date": "2024-06-01T08:00:00Z"}"#;
        assert!(serde_json::from_str::<ArticleSubmission>(body).is_err());
    }
}
