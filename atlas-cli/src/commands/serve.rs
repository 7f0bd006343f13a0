//! Serve command - run the tile proxy until interrupted.

use std::net::IpAddr;

use atlas::app::{AppConfig, AtlasApp};
use tokio_util::sync::CancellationToken;

use super::common::load_registry;
use crate::error::CliError;

/// Arguments for the serve command.
pub struct ServeArgs {
    pub address: Option<IpAddr>,
    pub port: Option<u16>,
    pub offline: bool,
}

/// Run the serve command.
pub fn run(args: ServeArgs, config: AppConfig) -> Result<(), CliError> {
    let mut config = config;
    if let Some(address) = args.address {
        config = config.with_address(address);
    }
    if let Some(port) = args.port {
        config = config.with_port(port);
    }
    if args.offline {
        config = config.with_offline(true);
    }

    // Validate the server list before printing the banner.
    let registry = load_registry(&config)?;

    println!("Atlas Tile Proxy v{}", atlas::VERSION);
    println!("=======================");
    println!();
    println!("Listening: http://{}", config.bind_addr());
    println!("Servers:   {}", config.rc_file.display());
    for server in registry.iter() {
        println!("  {:<12} {} [{}]", server.id(), server.title(), server.kind());
    }
    println!("Cache:     {}", config.cache_root().display());
    if config.offline {
        println!("Mode:      offline (cached tiles only)");
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    // Set up signal handler for graceful shutdown
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        shutdown_clone.cancel();
    })
    .map_err(|e| CliError::SignalHandler(e.to_string()))?;

    AtlasApp::run_blocking(config, shutdown)?;

    println!("Tile proxy stopped.");
    Ok(())
}
