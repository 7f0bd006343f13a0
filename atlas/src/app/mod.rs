//! Application bootstrap and lifecycle management.
//!
//! This module provides the `AtlasApp` type, which loads the tile server
//! list, starts the cache sweep daemon and the HTTP server, and stops them
//! together.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                         AtlasApp                          │
//! │                                                           │
//! │  AppConfig ──► TileServerRegistry (Arc, immutable)        │
//! │                   │                                       │
//! │                   ├──► SweepDaemon (one cache per server) │
//! │                   │                                       │
//! │                   └──► TileProxy ──► axum router          │
//! │                          ├── DiskTileCache                │
//! │                          ├── FetchCoalescer               │
//! │                          └── ReqwestClient                │
//! │                                                           │
//! │  CancellationToken ──► stops sweep daemon and server      │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use atlas::app::{AtlasApp, AppConfig};
//!
//! let app = AtlasApp::start(AppConfig::from_env()?).await?;
//! app.shutdown().await?;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::AtlasApp;
pub use config::{
    AppConfig, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_PORT, DEFAULT_RC_FILE, DEFAULT_SWEEP_INTERVAL_SECS,
};
pub use error::AppError;
