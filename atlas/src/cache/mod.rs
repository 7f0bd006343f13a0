//! Tile caching.
//!
//! - [`DiskTileCache`]: one folder of tile files per server, with a byte
//!   budget enforced by least-recently-used eviction
//! - [`SweepDaemon`]: the background task that enforces those budgets

mod disk;
mod sweep;

pub use disk::{format_size, CacheStats, DiskTileCache, SweepResult};
pub use sweep::SweepDaemon;

use thiserror::Error;

/// Errors from the tile cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The tile name would escape the cache folder.
    #[error("Invalid tile name: '{0}'")]
    InvalidName(String),

    /// The blocking task running the file operation failed.
    #[error("Failed to spawn task: {0}")]
    SpawnError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cache_err: CacheError = io_err.into();
        assert!(matches!(cache_err, CacheError::Io(_)));
    }

    #[test]
    fn test_cache_error_display() {
        let err = CacheError::InvalidName("../x".to_string());
        assert_eq!(err.to_string(), "Invalid tile name: '../x'");
    }
}
