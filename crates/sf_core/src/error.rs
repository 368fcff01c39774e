use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid article: {0}")]
    InvalidArticle(String),

    #[error("Feed returned {status}: {message}")]
    Feed { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// True when the remote news feed, not the local store, caused the failure.
    pub fn is_feed_failure(&self) -> bool {
        matches!(self, Error::Feed { .. } | Error::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
