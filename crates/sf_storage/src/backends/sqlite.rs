use async_trait::async_trait;
use sf_core::{Article, ArticleStatus, ArticleStorage, Error, Result, StoredArticle};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use crate::{BackendConfig, StorageBackend};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS {table} (
        id TEXT PRIMARY KEY,
        url TEXT NOT NULL UNIQUE,
        title TEXT,
        description TEXT,
        source TEXT NOT NULL,
        author TEXT,
        image_url TEXT,
        published_at TEXT,
        content TEXT
    )
"#;

fn db_error(context: &str) -> impl FnOnce(sqlx::Error) -> Error + '_ {
    move |e| Error::Database(format!("{}: {}", context, e))
}

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn upsert_status(existed: bool, rows_affected: u64) -> ArticleStatus {
    match (existed, rows_affected) {
        (_, 0) => ArticleStatus::Unchanged,
        (true, _) => ArticleStatus::Updated,
        (false, _) => ArticleStatus::New,
    }
}

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    table: String,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be writable at the configured path (default ./articles.db)"
    }

    fn default_config() -> BackendConfig {
        let path = std::env::var("SF_SQLITE_PATH").unwrap_or_else(|_| "articles.db".to_string());
        BackendConfig::new(path)
    }

    async fn connect(config: &BackendConfig) -> Result<Self> {
        let path = config
            .url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");
        Self::new_with_path(Path::new(path), &config.collection).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path, table: &str) -> Result<Self> {
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::Config(format!("Invalid table name: {}", table)));
        }

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        sqlx::query(&CREATE_TABLE.replace("{table}", table))
            .execute(&pool)
            .await
            .map_err(db_error("Failed to create articles table"))?;

        Ok(Self {
            pool: Arc::new(pool),
            table: table.to_string(),
        })
    }

    fn row_to_stored(row: &SqliteRow) -> Result<StoredArticle> {
        let published_at = row
            .try_get::<Option<String>, _>("published_at")
            .map_err(db_error("Failed to read published_at"))?
            .map(|raw| {
                chrono::DateTime::parse_from_rfc3339(&raw)
                    .map(|d| d.with_timezone(&chrono::Utc))
                    .map_err(|e| Error::Database(format!("Failed to parse date: {}", e)))
            })
            .transpose()?;

        let get = |column: &str| {
            row.try_get::<Option<String>, _>(column)
                .map_err(|e| Error::Database(format!("Failed to read {}: {}", column, e)))
        };

        Ok(StoredArticle {
            id: row.try_get("id").map_err(db_error("Failed to read id"))?,
            article: Article {
                url: row.try_get("url").map_err(db_error("Failed to read url"))?,
                title: get("title")?,
                description: get("description")?,
                source: row.try_get("source").map_err(db_error("Failed to read source"))?,
                author: get("author")?,
                image_url: get("image_url")?,
                published_at,
                content: get("content")?,
            },
        })
    }
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn upsert_article(&self, article: &Article) -> Result<ArticleStatus> {
        let published_at = article.published_at.map(|d| d.to_rfc3339());

        // Only reports whether the row predates this write; the write itself is one
        // autocommit statement so concurrent upserts queue on the busy timeout.
        let existed = sqlx::query(&format!("SELECT 1 FROM {} WHERE url = ?", self.table))
            .bind(&article.url)
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to look up article"))?
            .is_some();

        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {table}
            (id, url, title, description, source, author, image_url, published_at, content)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                source = excluded.source,
                author = excluded.author,
                image_url = excluded.image_url,
                published_at = excluded.published_at,
                content = excluded.content
            WHERE {table}.title IS NOT excluded.title
                OR {table}.description IS NOT excluded.description
                OR {table}.source IS NOT excluded.source
                OR {table}.author IS NOT excluded.author
                OR {table}.image_url IS NOT excluded.image_url
                OR {table}.published_at IS NOT excluded.published_at
                OR {table}.content IS NOT excluded.content
            "#,
            table = self.table
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&article.url)
        .bind(article.title.as_deref())
        .bind(article.description.as_deref())
        .bind(&article.source)
        .bind(article.author.as_deref())
        .bind(article.image_url.as_deref())
        .bind(published_at.as_deref())
        .bind(article.content.as_deref())
        .execute(&*self.pool)
        .await
        .map_err(db_error("Failed to upsert article"))?;

        Ok(upsert_status(existed, result.rows_affected()))
    }

    async fn list_articles(&self) -> Result<Vec<StoredArticle>> {
        let rows = sqlx::query(&format!("SELECT * FROM {} ORDER BY rowid", self.table))
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to list articles"))?;

        rows.iter().map(Self::row_to_stored).collect()
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<StoredArticle>> {
        let row = sqlx::query(&format!("SELECT * FROM {} WHERE url = ?", self.table))
            .bind(url)
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to get article"))?;

        row.as_ref().map(Self::row_to_stored).transpose()
    }

    async fn count_articles(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.table))
            .fetch_one(&*self.pool)
            .await
            .map_err(db_error("Failed to count articles"))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn article(url: &str, title: &str) -> Article {
        Article {
            url: url.to_string(),
            title: Some(title.to_string()),
            description: None,
            source: "test".to_string(),
            author: Some("Reporter".to_string()),
            image_url: None,
            published_at: Some(Utc.with_ymd_and_hms(2024, 3, 9, 15, 0, 0).unwrap()),
            content: Some("Full time".to_string()),
        }
    }

    #[tokio::test]
    async fn test_sqlite_upsert_statuses() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = SQLiteStorage::new_with_path(&db_path, "articles").await.unwrap();

        let a = article("https://a/1", "A");
        assert_eq!(storage.upsert_article(&a).await.unwrap(), ArticleStatus::New);
        assert_eq!(storage.upsert_article(&a).await.unwrap(), ArticleStatus::Unchanged);
        assert_eq!(
            storage.upsert_article(&article("https://a/1", "B")).await.unwrap(),
            ArticleStatus::Updated
        );

        let stored = storage.list_articles().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].article.title.as_deref(), Some("B"));
        assert_eq!(stored[0].article.published_at, a.published_at);
    }

    #[tokio::test]
    async fn test_sqlite_persists_across_connections() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        {
            let storage = SQLiteStorage::new_with_path(&db_path, "articles").await.unwrap();
            storage.upsert_article(&article("https://a/1", "A")).await.unwrap();
            storage.upsert_article(&article("https://a/2", "B")).await.unwrap();
        }

        let storage = SQLiteStorage::new_with_path(&db_path, "articles").await.unwrap();
        assert_eq!(storage.count_articles().await.unwrap(), 2);
        let found = storage.get_by_url("https://a/2").await.unwrap().unwrap();
        assert!(!found.id.is_empty());
        assert_eq!(found.article, article("https://a/2", "B"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_sqlite_concurrent_upserts() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = Arc::new(SQLiteStorage::new_with_path(&db_path, "articles").await.unwrap());

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    storage
                        .upsert_article(&article(&format!("https://a/{}", i), "A"))
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), ArticleStatus::New);
        }
        assert_eq!(storage.count_articles().await.unwrap(), 64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_sqlite_concurrent_upserts_same_url() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = Arc::new(SQLiteStorage::new_with_path(&db_path, "articles").await.unwrap());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    storage
                        .upsert_article(&article("https://a/1", &format!("Title {}", i)))
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(storage.count_articles().await.unwrap(), 1);
    }

    #[test]
    fn test_upsert_status_mapping() {
        assert_eq!(upsert_status(false, 1), ArticleStatus::New);
        assert_eq!(upsert_status(true, 1), ArticleStatus::Updated);
        assert_eq!(upsert_status(true, 0), ArticleStatus::Unchanged);
    }

    #[tokio::test]
    async fn test_sqlite_rejects_bad_table_name() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let result = SQLiteStorage::new_with_path(&db_path, "articles; DROP").await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
