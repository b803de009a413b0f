//! Dashboard demo: refresh collections from an admin API and print them.
//!
//! ```sh
//! cargo run --example dashboard -- --base-url http://localhost:8080
//! cargo run --example dashboard -- --config sync.toml containers
//! RUST_LOG=tincan_sync=debug cargo run --example dashboard
//! ```

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tincan_sync::{SyncConfig, SyncStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(about = "Fetch and print synchronized collections", long_about = None)]
struct Args {
    /// Base URL of the admin API
    #[arg(short, long, env = "TINCAN_SYNC_BASE_URL")]
    base_url: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Collections to fetch (default: all configured)
    collections: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("tincan_sync=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SyncConfig::load(path)?,
        None => SyncConfig::default(),
    };
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }

    let store: SyncStore = SyncStore::from_config(&config)?;

    let names: Vec<String> = if args.collections.is_empty() {
        store.collections().map(str::to_owned).collect()
    } else {
        args.collections
    };

    let mut subscriptions = Vec::new();
    for name in &names {
        let label = name.clone();
        subscriptions.push(store.subscribe(name, move |slot| {
            info!(
                collection = %label,
                loading = slot.is_loading,
                items = slot.items.len(),
                error = slot.error.as_deref().unwrap_or(""),
                "state changed"
            );
        })?);
    }

    let mut handles = Vec::new();
    for name in &names {
        handles.push(store.fetch(name)?);
    }
    for handle in handles {
        handle.settled().await?;
    }

    let mut failed = 0;
    for name in &names {
        let snapshot = store.snapshot(name)?;
        println!("== {name} ({} items)", snapshot.items.len());
        if let Some(error) = &snapshot.error {
            println!("   {error}");
            failed += 1;
        }
        for record in &snapshot.items {
            println!("   {}", serde_json::to_string(record)?);
        }
    }

    if failed > 0 {
        bail!("{failed} collection(s) failed to load");
    }
    Ok(())
}
