use async_trait::async_trait;
use sf_core::{ArticleStorage, Error, Result};
use std::env;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Hint shown when the backend cannot be reached.
    fn get_error_message() -> &'static str
    where
        Self: Sized;

    /// Default connection settings, with environment overrides applied.
    fn default_config() -> BackendConfig
    where
        Self: Sized;

    async fn connect(config: &BackendConfig) -> Result<Self>
    where
        Self: Sized;
}

/// Where and under which names a backend keeps its articles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub url: String,
    pub database: String,
    pub collection: String,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: env::var("SF_DATABASE").unwrap_or_else(|_| "news_db".to_string()),
            collection: env::var("SF_COLLECTION").unwrap_or_else(|_| "articles".to_string()),
        }
    }

    pub fn with_url(&mut self, url: &str) -> &mut Self {
        self.url = url.to_string();
        self
    }
}

/// Storage kinds compiled into this build.
pub fn available_backends() -> Vec<&'static str> {
    let mut kinds = vec!["memory"];
    if cfg!(feature = "sqlite") {
        kinds.push("sqlite");
    }
    if cfg!(feature = "mongodb") {
        kinds.push("mongodb");
    }
    kinds
}

async fn connect_backend<T: StorageBackend + ArticleStorage + 'static>(
    backend_url: Option<&str>,
) -> Result<Arc<dyn ArticleStorage>> {
    let mut config = T::default_config();
    if let Some(url) = backend_url {
        config.with_url(url);
    }
    tracing::debug!("Connecting storage backend with {:?}", config);
    let storage = T::connect(&config).await.map_err(|e| {
        Error::Storage(format!("{} ({})", e, T::get_error_message()))
    })?;
    Ok(Arc::new(storage))
}

/// Build the storage handle shared by every operation for the life of the process.
pub async fn create_storage(kind: &str, backend_url: Option<&str>) -> Result<Arc<dyn ArticleStorage>> {
    match kind {
        "memory" => connect_backend::<MemoryStorage>(backend_url).await,
        #[cfg(feature = "sqlite")]
        "sqlite" => connect_backend::<SQLiteStorage>(backend_url).await,
        #[cfg(feature = "mongodb")]
        "mongodb" | "mongo" => connect_backend::<MongoStorage>(backend_url).await,
        other => Err(Error::Storage(format!(
            "Unknown storage backend '{}', available: {}",
            other,
            available_backends().join(", ")
        ))),
    }
}
