//! Origin tile servers.
//!
//! This module provides the HTTP plumbing used to fetch tiles that are not
//! cached yet:
//!
//! - [`AsyncHttpClient`] abstracts the transport so tests can inject a mock
//! - [`ReqwestClient`] is the real client, with a bounded timeout
//! - the street-map helpers resolve grid tiles to provider tokens
//!
//! # Example
//!
//! ```ignore
//! use atlas::provider::{AsyncHttpClient, ReqwestClient};
//!
//! let client = ReqwestClient::new()?;
//! let bytes = client.get("https://tile.openstreetmap.org/12/2031/1358.png").await?;
//! ```

mod http;
mod streetmap;

use std::time::Duration;

use thiserror::Error;

pub use http::{AsyncHttpClient, ReqwestClient, DEFAULT_FETCH_TIMEOUT};
pub use streetmap::{lookup_token, lookup_url, parse_lookup_response, StreetMapToken};

#[cfg(test)]
pub use http::tests::MockHttpClient;

/// A failed origin fetch.
///
/// Fetch failures are never retried by the proxy; the request that caused
/// them is answered with "not found". The type is `Clone` so one outcome
/// can be shared with every request waiting on the same tile.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure or a non-success HTTP status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The origin did not answer in time.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Origin fetches are disabled.
    #[error("Offline mode: origin fetches are disabled")]
    Offline,

    /// The street-map token lookup failed.
    #[error("Tile lookup failed: {0}")]
    Lookup(String),

    /// The request leading the fetch went away before finishing it.
    #[error("Fetch abandoned before completion")]
    Abandoned,
}
