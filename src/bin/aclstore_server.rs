//!
//! aclstore server binary
//! ----------------------
//! Command-line entry point for the aclstore HTTP server. Supports configuration
//! via CLI flags and environment variables; see `--help`.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use aclstore::config::{has_flag, ServerConfig, USAGE};
use aclstore::server;
use aclstore::storage::MemoryManager;

#[tokio::main]
async fn main() -> Result<()> {
    println!(r"            _     _                 
  __ _  ___| |___| |_ ___  _ __ ___ 
 / _` |/ __| / __| __/ _ \| '__/ _ \
| (_| | (__| \__ \ || (_) | | |  __/
 \__,_|\___|_|___/\__\___/|_|  \___|");

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let args: Vec<String> = env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{USAGE}");
        return Ok(());
    }

    let config = ServerConfig::from_env_and_args(&args).context("invalid server configuration")?;

    let manager = MemoryManager::new();
    if let Some(seed) = &config.seed_file {
        let loaded = manager
            .load_seed_file(seed, &config.namespace)
            .with_context(|| format!("failed to load seed file {}", seed.display()))?;
        info!(target: "startup", "Seeded {} records from {}", loaded, seed.display());
    }

    server::run(&config, Arc::new(manager)).await
}
