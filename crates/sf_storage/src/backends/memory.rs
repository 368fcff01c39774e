use async_trait::async_trait;
use sf_core::{Article, ArticleStatus, ArticleStorage, Result, StoredArticle};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use crate::{BackendConfig, StorageBackend};

#[derive(Default)]
pub struct MemoryStore {
    articles: Vec<(String, Article)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_article(&mut self, article: &Article) -> ArticleStatus {
        if let Some((_, existing)) = self.articles.iter_mut().find(|(_, a)| a.url == article.url) {
            if existing == article {
                return ArticleStatus::Unchanged;
            }
            *existing = article.clone();
            ArticleStatus::Updated
        } else {
            self.articles.push((Uuid::new_v4().to_string(), article.clone()));
            ArticleStatus::New
        }
    }

    pub fn list_articles(&self) -> Vec<StoredArticle> {
        self.articles
            .iter()
            .map(|(id, article)| StoredArticle {
                id: id.clone(),
                article: article.clone(),
            })
            .collect()
    }

    pub fn get_by_url(&self, url: &str) -> Option<StoredArticle> {
        self.articles
            .iter()
            .find(|(_, a)| a.url == url)
            .map(|(id, article)| StoredArticle {
                id: id.clone(),
                article: article.clone(),
            })
    }
}

pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::new())),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    fn default_config() -> BackendConfig {
        BackendConfig::new("memory://")
    }

    async fn connect(_config: &BackendConfig) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn upsert_article(&self, article: &Article) -> Result<ArticleStatus> {
        let mut store = self.store.write().await;
        Ok(store.upsert_article(article))
    }

    async fn list_articles(&self) -> Result<Vec<StoredArticle>> {
        let store = self.store.read().await;
        Ok(store.list_articles())
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<StoredArticle>> {
        let store = self.store.read().await;
        Ok(store.get_by_url(url))
    }

    async fn count_articles(&self) -> Result<u64> {
        let store = self.store.read().await;
        Ok(store.articles.len() as u64)
    }
}
