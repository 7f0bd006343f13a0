//! CLI command implementations.

pub mod cache;
pub mod common;
pub mod grid_ref;
pub mod serve;
pub mod tiles;
