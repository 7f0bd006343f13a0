//! Atlas CLI - Command-line interface
//!
//! This binary runs the Atlas tile proxy and exposes the library's grid
//! reference and tile helpers on the command line.

mod commands;
mod error;

use std::net::IpAddr;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::common::{resolve_config, ConfigArgs};
use commands::grid_ref::RefAction;
use commands::serve::ServeArgs;
use commands::tiles::TilesArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "atlas", version, about = "National grid maps from slippy-map tile servers")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the caching tile proxy
    Serve {
        /// Listening address (overrides ATLAS_ADDRESS)
        #[arg(long)]
        address: Option<IpAddr>,

        /// Listening port (overrides ATLAS_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Serve cached tiles only
        #[arg(long)]
        offline: bool,
    },

    /// Convert grid references
    Ref {
        #[command(subcommand)]
        action: RefAction,
    },

    /// Print the proxy URLs of the tiles around a grid reference
    Tiles {
        /// Centre grid reference, e.g. `SU 372 155`
        #[arg(required = true, num_args = 1..)]
        center: Vec<String>,

        /// Tile server id (defaults to the first configured server)
        #[arg(short, long)]
        server: Option<String>,

        /// Requested zoom, snapped to the server's allowed levels
        #[arg(short, long)]
        zoom: Option<f64>,

        /// Tiles either side of the centre column
        #[arg(short = 'W', long, default_value_t = 1)]
        width: u32,

        /// Tiles above and below the centre row
        #[arg(short = 'H', long, default_value_t = 1)]
        height: u32,
    },

    /// Manage the tile caches
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    atlas::logging::init(if cli.verbose {
        "atlas=debug,info"
    } else {
        atlas::logging::DEFAULT_FILTER
    });

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Serve {
            address,
            port,
            offline,
        } => commands::serve::run(
            ServeArgs {
                address,
                port,
                offline,
            },
            resolve_config(&cli.config)?,
        ),
        Commands::Ref { action } => commands::grid_ref::run(action),
        Commands::Tiles {
            center,
            server,
            zoom,
            width,
            height,
        } => commands::tiles::run(
            TilesArgs {
                center: center.join(" "),
                server,
                zoom,
                width,
                height,
            },
            &resolve_config(&cli.config)?,
        ),
        Commands::Cache { action } => commands::cache::run(action, &resolve_config(&cli.config)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_tiles_arguments() {
        let cli = Cli::try_parse_from(["atlas", "tiles", "SU", "372", "155", "-W", "2", "--server", "osm"]).unwrap();
        match cli.command {
            Commands::Tiles {
                center, width, height, server, ..
            } => {
                assert_eq!(center.join(" "), "SU 372 155");
                assert_eq!(width, 2);
                assert_eq!(height, 1);
                assert_eq!(server.as_deref(), Some("osm"));
            }
            _ => panic!("expected tiles"),
        }
    }

    #[test]
    fn test_global_rc_flag() {
        let cli = Cli::try_parse_from(["atlas", "cache", "stats", "--rc", "/etc/atlasrc.json"]).unwrap();
        assert_eq!(cli.config.rc.as_deref(), Some(std::path::Path::new("/etc/atlasrc.json")));
    }
}
