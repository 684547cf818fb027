//! AZ Fanpage offline proxy - hosts the cache engine in front of the PWA origin.
//!
//! Every page request goes through the engine's classification and caching
//! strategies before reaching the origin. Push, notification-click and sync
//! events are accepted as JSON on `/__sw/*`.

mod server;

use anyhow::Result;
use azsw_core::{
    CacheEngine, CacheStorage, EngineConfig, HttpFetcher, MemoryStorage, SqliteStorage,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "azsw-proxy")]
#[command(about = "Offline-first caching proxy for the AZ fanpage")]
struct Args {
    /// Origin to proxy (overrides the scope from --config)
    #[arg(long)]
    origin: Option<Url>,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "8787")]
    port: u16,

    /// SQLite database for cache partitions (in memory when omitted)
    #[arg(long)]
    db: Option<PathBuf>,

    /// JSON engine configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(origin) = &args.origin {
        config.scope = origin.clone();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting AZ fanpage offline proxy");

    let config = load_config(&args)?;
    info!("Origin: {} (cache version {})", config.scope, config.version);

    let storage: Arc<dyn CacheStorage> = match &args.db {
        Some(path) => {
            info!("Cache database: {}", path.display());
            Arc::new(SqliteStorage::open_path(path)?)
        }
        None => Arc::new(MemoryStorage::new()),
    };
    let fetcher = Arc::new(HttpFetcher::new()?);

    let engine = CacheEngine::builder(config)
        .storage(storage)
        .fetcher(fetcher.clone())
        .build()?;

    // A failed install leaves the engine bypassing every request; the proxy
    // still serves straight from the origin.
    match engine.install().await {
        Ok(report) => {
            info!("Installed {} seed entries", report.cached);
            match engine.activate().await {
                Ok(report) => {
                    for name in &report.deleted {
                        info!("Removed stale partition {}", name);
                    }
                }
                Err(e) => error!("Activation failed: {}", e),
            }
        }
        Err(e) => warn!("Install failed, running as plain proxy: {}", e),
    }

    let addr = server::start_server(Arc::new(engine), fetcher, &args.host, args.port).await?;
    info!("Proxy running on http://{}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
