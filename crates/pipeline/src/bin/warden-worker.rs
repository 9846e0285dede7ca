//! warden-worker — background content-filtering worker.
//!
//! Watches the client's content cache for new downloads, tails the client
//! log to find safe write windows, and deactivates blocklisted scene
//! objects in downloaded worlds.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::Notify;
use tracing::info;
use tracing_subscriber::EnvFilter;

use warden_assets::{AssetStore, BundleIndexer, JsonAssetStore};
use warden_core::config::{self, Config};
use warden_pipeline::Pipeline;

// ── CLI ─────────────────────────────────────────────────────────────

/// Background content-filtering worker for the client cache.
#[derive(Parser, Debug)]
#[command(name = "warden-worker", version, about)]
struct Cli {
    /// Root of the downloaded-content cache (watched recursively).
    #[arg(long)]
    content_root: Option<PathBuf>,

    /// Directory containing the client's log files.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Directory containing blocklist definition files.
    #[arg(long)]
    blocklist_dir: Option<PathBuf>,

    /// Where the content index is persisted.
    #[arg(long)]
    index_path: Option<PathBuf>,

    /// Match and log without writing any asset file.
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Layer CLI overrides on top of the env-derived config.
    fn apply(self, mut config: Config) -> Config {
        if let Some(v) = self.content_root {
            config.content_root = v;
        }
        if let Some(v) = self.log_dir {
            config.log_dir = v;
        }
        if let Some(v) = self.blocklist_dir {
            config.blocklist_dir = v;
        }
        if let Some(v) = self.index_path {
            config.index_path = v;
        }
        if self.dry_run {
            config.dry_run = true;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().apply(Config::from_env());
    info!(
        content_root = %config.content_root.display(),
        log_dir = %config.log_dir.display(),
        blocklist_dir = %config.blocklist_dir.display(),
        dry_run = config.dry_run,
        "starting warden-worker"
    );

    let store: Arc<dyn AssetStore> = Arc::new(JsonAssetStore::new());
    let indexer = Arc::new(BundleIndexer::new(store.clone()));
    let pipeline = Arc::new(Pipeline::new(config, indexer, store)?);

    let shutdown = Arc::new(Notify::new());
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_shutdown.notify_waiters();
        }
    });

    pipeline.run(shutdown).await?;
    info!("warden-worker shutdown complete");
    Ok(())
}
