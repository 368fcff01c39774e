use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{self, doc, Bson, Document},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, UpdateOptions},
    Client, Collection, IndexModel,
};
use sf_core::{Article, ArticleStatus, ArticleStorage, Error, Result, StoredArticle};
use crate::{BackendConfig, StorageBackend};

fn mongo_error(context: &'static str) -> impl FnOnce(mongodb::error::Error) -> Error {
    move |e| Error::Database(format!("{}: {}", context, e))
}

const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn upsert_status(upserted: bool, modified_count: u64) -> ArticleStatus {
    if upserted {
        ArticleStatus::New
    } else if modified_count > 0 {
        ArticleStatus::Updated
    } else {
        ArticleStatus::Unchanged
    }
}

/// Articles kept as one document per url, with the server-generated `_id`.
pub struct MongoStorage {
    collection: Collection<Document>,
}

#[async_trait]
impl StorageBackend for MongoStorage {
    fn get_error_message() -> &'static str {
        "MongoDB should be running on mongodb://localhost:27017 (or MONGO_URL)"
    }

    fn default_config() -> BackendConfig {
        let url = std::env::var("MONGO_URL").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        BackendConfig::new(url)
    }

    async fn connect(config: &BackendConfig) -> Result<Self> {
        let client = Client::with_uri_str(&config.url)
            .await
            .map_err(mongo_error("Failed to parse MongoDB url"))?;
        let database = client.database(&config.database);

        database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(mongo_error("Failed to reach MongoDB"))?;

        let collection = database.collection::<Document>(&config.collection);
        let index = IndexModel::builder()
            .keys(doc! { "url": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection
            .create_index(index, None)
            .await
            .map_err(mongo_error("Failed to create url index"))?;

        tracing::debug!("Connected to MongoDB collection {}.{}", config.database, config.collection);
        Ok(Self { collection })
    }
}

impl MongoStorage {
    fn document_to_stored(mut document: Document) -> Result<StoredArticle> {
        let id = match document.remove("_id") {
            Some(Bson::ObjectId(oid)) => oid.to_hex(),
            Some(other) => other.to_string(),
            None => return Err(Error::Database("Stored article has no _id".to_string())),
        };
        let article: Article = bson::from_document(document)
            .map_err(|e| Error::Database(format!("Failed to decode article: {}", e)))?;
        Ok(StoredArticle { id, article })
    }
}

#[async_trait]
impl ArticleStorage for MongoStorage {
    async fn upsert_article(&self, article: &Article) -> Result<ArticleStatus> {
        let fields = bson::to_document(article)
            .map_err(|e| Error::Database(format!("Failed to encode article: {}", e)))?;

        let filter = doc! { "url": article.url.as_str() };
        let update = doc! { "$set": fields };
        let options = UpdateOptions::builder().upsert(true).build();

        // Two first-time upserts of one url can both miss the filter; the loser hits the
        // unique index and succeeds as an update on the second attempt.
        let result = match self
            .collection
            .update_one(filter.clone(), update.clone(), options.clone())
            .await
        {
            Err(e) if is_duplicate_key(&e) => {
                tracing::debug!("Retrying upsert of {} after duplicate key", article.url);
                self.collection.update_one(filter, update, options).await
            }
            other => other,
        }
        .map_err(mongo_error("Failed to upsert article"))?;

        Ok(upsert_status(result.upserted_id.is_some(), result.modified_count))
    }

    async fn list_articles(&self) -> Result<Vec<StoredArticle>> {
        let documents: Vec<Document> = self
            .collection
            .find(None, None)
            .await
            .map_err(mongo_error("Failed to list articles"))?
            .try_collect()
            .await
            .map_err(mongo_error("Failed to read articles"))?;

        documents.into_iter().map(Self::document_to_stored).collect()
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<StoredArticle>> {
        self.collection
            .find_one(doc! { "url": url }, None)
            .await
            .map_err(mongo_error("Failed to get article"))?
            .map(Self::document_to_stored)
            .transpose()
    }

    async fn count_articles(&self) -> Result<u64> {
        self.collection
            .count_documents(None, None)
            .await
            .map_err(mongo_error("Failed to count articles"))
    }
}
