use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use sf_core::{Error, FeedArticle, FeedResponse, Result};
use std::fmt;
use url::Url;

use super::FeedSource;

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org";
pub const DEFAULT_QUERY: &str = "football";
const API_KEY_HEADER: &str = "X-Api-Key";

/// reqwest errors carry the request url; keep it out of logs and responses.
fn redact(err: reqwest::Error) -> Error {
    Error::Http(err.without_url())
}

/// Connection settings for a NewsAPI-compatible `everything` endpoint.
#[derive(Clone)]
pub struct NewsApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub query: String,
    pub language: Option<String>,
    pub page_size: Option<u32>,
}

impl NewsApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            query: DEFAULT_QUERY.to_string(),
            language: None,
            page_size: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    fn endpoint(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .and_then(|base| base.join("v2/everything"))
            .map_err(|e| Error::Config(format!("Invalid feed url {}: {}", self.base_url, e)))
    }
}

impl fmt::Debug for NewsApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("query", &self.query)
            .field("language", &self.language)
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

pub struct NewsApiSource {
    client: Client,
    config: NewsApiConfig,
}

impl NewsApiSource {
    pub fn new(config: NewsApiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Config("NewsAPI key is required".to_string()));
        }
        let client = Client::builder()
            .user_agent(concat!("sportsfeed/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &NewsApiConfig {
        &self.config
    }
}

impl fmt::Debug for NewsApiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiSource")
            .field("client", &"<reqwest::Client>")
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl FeedSource for NewsApiSource {
    fn name(&self) -> &str {
        "NewsAPI"
    }

    async fn fetch_articles(&self) -> Result<Vec<FeedArticle>> {
        let mut request = self
            .client
            .get(self.config.endpoint()?)
            .header(API_KEY_HEADER, self.config.api_key.as_str())
            .query(&[("q", self.config.query.as_str())]);
        if let Some(language) = &self.config.language {
            request = request.query(&[("language", language)]);
        }
        if let Some(page_size) = self.config.page_size {
            request = request.query(&[("pageSize", page_size)]);
        }

        let response = request.send().await.map_err(redact)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(Error::Feed {
                status: status.as_u16(),
                message,
            });
        }

        let body: FeedResponse = response.json().await.map_err(redact)?;
        tracing::debug!(
            "NewsAPI returned {} articles (totalResults {:?})",
            body.articles.len(),
            body.total_results
        );
        Ok(body.articles)
    }
}
