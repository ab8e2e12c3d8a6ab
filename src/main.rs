//! billweb main entry point

use anyhow::{anyhow, Context};
use billweb_api::start_server;
use billweb_config::{Config, ConfigError, StorageBackend};
use billweb_core::{Ledger, StoreRef};
use billweb_store::{MemoryIndex, MemoryStore, SqliteStore};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "billweb")]
#[command(version = "0.1.0")]
#[command(about = "A personal ledger service with statement-cycle aware spending reports", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn open_store(config: &Config) -> anyhow::Result<StoreRef> {
    let store: StoreRef = match config.storage.backend {
        StorageBackend::Memory => {
            log::warn!("Using the in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Sqlite => Arc::new(
            SqliteStore::open(&config.storage.path)
                .with_context(|| format!("Failed to open {}", config.storage.path.display()))?,
        ),
    };
    Ok(store)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let (config, missing) = match Config::load(&args.config) {
        Ok(config) => (config, false),
        Err(ConfigError::FileNotFound { .. }) => (Config::default(), true),
        Err(e) => return Err(anyhow!("{}", e.to_details())),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    if missing {
        log::warn!(
            "Config file {} not found, using defaults",
            args.config.display()
        );
    }

    let store = open_store(&config)?;
    let index = Arc::new(MemoryIndex::new(config.search.max_results));
    let ledger = Arc::new(Ledger::new(store, index, config.search.clone()));

    // The index lives in memory and starts empty
    let indexed = ledger.reindex().context("Failed to build the search index")?;
    log::info!(
        "Ledger ready: {} backend, {} records indexed",
        config.storage.backend,
        indexed
    );

    let rt = Runtime::new()?;
    rt.block_on(start_server(config, ledger))?;

    Ok(())
}
