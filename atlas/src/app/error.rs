//! Application error types.

use std::fmt;

use crate::config::ConfigError;
use crate::provider::FetchError;

/// Errors that can occur during application lifecycle.
#[derive(Debug)]
pub enum AppError {
    /// The configuration could not be loaded.
    Config(ConfigError),

    /// The HTTP client could not be built.
    Client(FetchError),

    /// The listening socket could not be bound.
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    /// The server stopped with an error.
    Server(std::io::Error),

    /// Failed to create the Tokio runtime.
    RuntimeCreation(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => {
                write!(f, "Configuration error: {}", e)
            }
            AppError::Client(e) => {
                write!(f, "Failed to create HTTP client: {}", e)
            }
            AppError::Bind { addr, source } => {
                write!(f, "Failed to listen on {}: {}", addr, source)
            }
            AppError::Server(e) => {
                write!(f, "Server error: {}", e)
            }
            AppError::RuntimeCreation(msg) => {
                write!(f, "Failed to create Tokio runtime: {}", msg)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Client(e) => Some(e),
            AppError::Bind { source, .. } => Some(source),
            AppError::Server(e) => Some(e),
            AppError::RuntimeCreation(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        AppError::Client(e)
    }
}
