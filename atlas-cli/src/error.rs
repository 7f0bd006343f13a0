//! CLI error type.

use atlas::app::AppError;
use atlas::config::ConfigError;
use atlas::grid_ref::GridRefError;
use atlas::tile::TileError;
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    App(#[from] AppError),

    #[error("{0}")]
    GridRef(#[from] GridRefError),

    #[error("{0}")]
    Tile(#[from] TileError),

    #[error("Unknown tile server '{0}'")]
    UnknownServer(String),

    #[error("Failed to create Tokio runtime: {0}")]
    Runtime(String),

    #[error("Failed to set signal handler: {0}")]
    SignalHandler(String),
}
