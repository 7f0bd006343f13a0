//! Atlas - national grid references and a caching map tile proxy
//!
//! This library converts between national grid references and WGS84
//! coordinates, addresses map tiles in several tiling schemes, and serves
//! tiles from budgeted on-disk caches filled from origin tile servers.
//!
//! # Modules
//!
//! - [`grid_ref`]: grid reference encoding and decoding
//! - [`geodetic`]: grid ↔ longitude/latitude conversion
//! - [`tile`]: quadkey, ZXY, TMS and street-map tile addressing
//! - [`zoom`]: allowed zoom levels and nearest-zoom selection
//! - [`cache`]: per-server tile caches and the sweep daemon
//! - [`provider`]: origin HTTP fetching
//! - [`config`]: rc file and environment configuration
//! - [`service`]: the caching, coalescing tile proxy
//! - [`server`]: the HTTP front end
//! - [`app`]: application bootstrap

pub mod app;
pub mod cache;
pub mod config;
pub mod geodetic;
pub mod grid_ref;
pub mod logging;
pub mod provider;
pub mod server;
pub mod service;
pub mod tile;
pub mod vector;
pub mod zoom;

/// Version of the atlas library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
