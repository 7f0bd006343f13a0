//! Cache management CLI commands.

use atlas::app::AppConfig;
use atlas::cache::{format_size, SweepDaemon};
use clap::Subcommand;
use tokio::runtime::Runtime;

use super::common::load_registry;
use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show each server's cache usage
    Stats,
    /// Trim every cache to its budget now
    Sweep,
}

/// Run a cache subcommand.
pub fn run(action: CacheAction, config: &AppConfig) -> Result<(), CliError> {
    let registry = load_registry(config)?;
    let runtime = Runtime::new().map_err(|e| CliError::Runtime(e.to_string()))?;

    match action {
        CacheAction::Stats => {
            for server in registry.iter() {
                let cache = server.cache();
                let budget = match cache.budget() {
                    0 => "unlimited".to_string(),
                    bytes => format_size(bytes),
                };
                println!("{} ({})", server.id(), cache.folder().display());
                match runtime.block_on(cache.stats()) {
                    Ok(stats) => println!("  {} of {}", stats, budget),
                    Err(e) => println!("  unavailable: {}", e),
                }
            }
            Ok(())
        }
        CacheAction::Sweep => {
            let daemon = SweepDaemon::new(registry.caches(), config.sweep_interval());
            let results = runtime.block_on(daemon.sweep_all());
            if results.is_empty() {
                println!("No budgeted caches to sweep");
            }
            for (id, result) in results {
                println!("{}: {}", id, result);
            }
            Ok(())
        }
    }
}
