//! Configuration loading.
//!
//! - [`TileServerRegistry`]: the tile servers declared in the rc file
//! - [`env`]: the `ATLAS_*` environment variables
//!
//! # Example
//!
//! ```ignore
//! use atlas::config::TileServerRegistry;
//! use atlas::geodetic::GeodeticTransform;
//!
//! let registry = TileServerRegistry::load("atlasrc.json", "/var/cache/atlas", GeodeticTransform::national_grid())?;
//! let server = registry.get("osm").unwrap_or(registry.default_server());
//! ```

pub mod env;
mod registry;
mod server;

use std::path::PathBuf;

use thiserror::Error;

pub use registry::TileServerRegistry;
pub use server::{DisplayFlags, ServerEntry, TileServerConfig};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A server entry names an unknown tile scheme.
    #[error("Unsupported server type: '{0}'")]
    UnsupportedServerType(String),

    /// A server entry lacks a required field.
    #[error("Server '{server}' is missing '{field}'")]
    MissingField { server: String, field: &'static str },

    /// Two servers would write to one cache folder.
    #[error("Servers '{first}' and '{second}' share cache folder {}", .folder.display())]
    SharedFolder {
        folder: PathBuf,
        first: String,
        second: String,
    },

    /// A server names a zoom level no tile scheme can address.
    #[error("Server '{server}' uses zoom {zoom}, above the maximum of {max}")]
    ZoomOutOfRange { server: String, zoom: u8, max: u8 },

    /// Two servers share an id.
    #[error("Duplicate server id: '{0}'")]
    DuplicateId(String),

    /// The rc file declares no usable server.
    #[error("No tile servers configured")]
    NoServers,

    /// The rc file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rc file is not valid.
    #[error("Invalid configuration: {0}")]
    Parse(String),

    /// An environment variable holds an unusable value.
    #[error("Invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::SharedFolder {
            folder: PathBuf::from("/cache/osm"),
            first: "a".to_string(),
            second: "b".to_string(),
        };
        assert_eq!(err.to_string(), "Servers 'a' and 'b' share cache folder /cache/osm");

        let err = ConfigError::Env {
            var: "ATLAS_PORT",
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid value for ATLAS_PORT: 'abc'");
    }
}
