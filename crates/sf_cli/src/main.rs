use anyhow::{anyhow, Context};
use clap::Parser;
use sf_core::ArticleStorage;
use sf_fetch::{init_logging, Ingestor, NewsApiConfig, NewsApiSource};
use sf_web::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fetch sports news into a document store and serve it over HTTP", long_about = None)]
pub struct Cli {
    /// Storage backend: memory, sqlite or mongodb
    #[arg(long, env = "SF_STORAGE", default_value = "memory", global = true)]
    storage: String,
    /// Connection url or path for the storage backend
    #[arg(long, env = "SF_BACKEND_URL", global = true)]
    backend_url: Option<String>,
    /// NewsAPI key
    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,
    /// Search query sent to the news feed
    #[arg(long, env = "SF_QUERY", default_value = sf_fetch::sources::newsapi::DEFAULT_QUERY, global = true)]
    query: String,
    #[arg(long, env = "SF_FEED_URL", default_value = sf_fetch::sources::newsapi::DEFAULT_BASE_URL, global = true)]
    feed_url: String,
    #[arg(long, global = true)]
    language: Option<String>,
    #[arg(long, global = true)]
    page_size: Option<u32>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service
    Serve {
        #[arg(long, env = "SF_BIND", default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
    },
    /// Fetch one batch from the feed and store it
    Fetch,
    /// Print every stored article as JSON
    List,
}

impl Cli {
    fn feed_config(&self) -> anyhow::Result<NewsApiConfig> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("NewsAPI key missing: pass --api-key or set NEWSAPI_KEY"))?;
        let mut config = NewsApiConfig::new(api_key)
            .with_base_url(self.feed_url.clone())
            .with_query(self.query.clone());
        config.language = self.language.clone();
        config.page_size = self.page_size;
        Ok(config)
    }

    fn ingestor(&self, storage: Arc<dyn ArticleStorage>) -> anyhow::Result<Ingestor> {
        let source = NewsApiSource::new(self.feed_config()?)?;
        Ok(Ingestor::new(storage, Arc::new(source)))
    }
}

async fn check_storage(storage: &Arc<dyn ArticleStorage>, storage_type: &str) -> anyhow::Result<()> {
    let count = storage
        .count_articles()
        .await
        .with_context(|| format!("Storage backend {} is not reachable", storage_type))?;
    info!("🏦 Storage backend initialized (using {}, {} articles stored)", storage_type, count);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("🛑 Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    info!("💾 Checking storage connection...");
    let storage = sf_storage::create_storage(&cli.storage, cli.backend_url.as_deref()).await?;
    check_storage(&storage, &cli.storage).await?;

    match &cli.command {
        Commands::Serve { bind } => {
            let ingestor = cli.ingestor(storage)?;
            let state = AppState::new(Arc::new(ingestor));
            sf_web::serve(*bind, state, shutdown_signal()).await?;
        }
        Commands::Fetch => {
            let report = cli.ingestor(storage)?.ingest().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::List => {
            let articles = storage.list_articles().await?;
            println!("{}", serde_json::to_string_pretty(&articles)?);
        }
    }

    Ok(())
}
