//! The tile proxy.
//!
//! [`TileProxy`] answers one tile request: it serves the server's cached
//! copy when there is one, and otherwise fetches the tile from the origin,
//! stores it and serves it. Concurrent misses for one tile share a single
//! origin fetch through the [`FetchCoalescer`].
//!
//! # Example
//!
//! ```ignore
//! use atlas::service::TileProxy;
//!
//! let proxy = TileProxy::new(registry, ReqwestClient::new()?, false);
//! let tile = proxy.serve_tile("osm", "12/2047/1362").await?;
//! assert_eq!(tile.content_type, "image/jpeg");
//! ```

mod coalesce;

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

pub use coalesce::{wait_for, CoalesceResult, CoalescerStats, FetchCoalescer, FetchOutcome, LeaderGuard};

use crate::cache::{CacheError, DiskTileCache};
use crate::config::{TileServerConfig, TileServerRegistry};
use crate::provider::{lookup_token, AsyncHttpClient, FetchError};
use crate::tile::{GridTile, TileAddress, TileError, UrlTemplate};

/// Why a tile could not be served. Every variant is answered with 404.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Unknown tile server: '{0}'")]
    UnknownServer(String),

    #[error("Bad tile address '{address}' for server '{server}': {source}")]
    BadAddress {
        server: String,
        address: String,
        #[source]
        source: TileError,
    },

    #[error("No origin URL for zoom {zoom:?} on server '{server}'")]
    NoOriginUrl { server: String, zoom: Option<u8> },

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// A served tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileResponse {
    pub bytes: Bytes,
    pub content_type: &'static str,
    pub cache_hit: bool,
}

/// How the origin copy of a tile is obtained.
enum OriginRequest<'a> {
    /// One GET of a fully rendered URL.
    Direct(String),
    /// A token lookup, then a GET of `template` filled with the token.
    Lookup {
        lookup: &'a UrlTemplate,
        template: &'a UrlTemplate,
        tile: GridTile,
    },
}

/// Caching, coalescing tile proxy over a set of servers.
pub struct TileProxy<C> {
    registry: Arc<TileServerRegistry>,
    client: C,
    coalescer: FetchCoalescer,
    offline: bool,
}

impl<C: AsyncHttpClient> TileProxy<C> {
    /// Creates a proxy. When `offline` is set only cached tiles are served.
    pub fn new(registry: Arc<TileServerRegistry>, client: C, offline: bool) -> Self {
        Self {
            registry,
            client,
            coalescer: FetchCoalescer::new(),
            offline,
        }
    }

    pub fn registry(&self) -> &TileServerRegistry {
        &self.registry
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn coalescer_stats(&self) -> CoalescerStats {
        self.coalescer.stats()
    }

    /// Serves the tile at `address` from server `server_id`.
    ///
    /// # Errors
    ///
    /// Unknown servers and unparsable addresses fail before any I/O. A miss
    /// fails with [`FetchError::Offline`] in offline mode, or with the origin
    /// failure; nothing is cached in either case.
    pub async fn serve_tile(&self, server_id: &str, address: &str) -> Result<TileResponse, ProxyError> {
        let start = Instant::now();
        let server = self
            .registry
            .get(server_id)
            .ok_or_else(|| ProxyError::UnknownServer(server_id.to_string()))?;
        let bad_address = |source: TileError| ProxyError::BadAddress {
            server: server_id.to_string(),
            address: address.to_string(),
            source,
        };

        let scheme = server.scheme();
        let tile = scheme.parse_address(address).map_err(bad_address)?;
        let name = scheme.path_to_tile(&tile).map_err(bad_address)?;
        let cache = server.cache();
        let content_type = scheme.content_type();

        if let Some(bytes) = cache.get(&name).await? {
            debug!(server = %server_id, tile = %tile, size = bytes.len(), "cache hit");
            return Ok(TileResponse {
                bytes,
                content_type,
                cache_hit: true,
            });
        }

        if self.offline {
            debug!(server = %server_id, tile = %tile, "cache miss while offline");
            return Err(FetchError::Offline.into());
        }

        let origin = origin_request(server, &tile)?;
        let key = format!("{}/{}", server.id(), name);
        let outcome = match self.coalescer.register(&key) {
            CoalesceResult::Coalesced(rx) => {
                debug!(server = %server_id, tile = %tile, "waiting for in-flight fetch");
                wait_for(rx).await
            }
            CoalesceResult::NewRequest(guard) => {
                let outcome = self.fetch_and_store(&cache, &name, origin).await;
                guard.complete(outcome.clone());
                outcome
            }
        };

        let bytes = outcome.inspect_err(|e| {
            warn!(server = %server_id, tile = %tile, error = %e, "tile fetch failed");
        })?;
        debug!(
            server = %server_id,
            tile = %tile,
            size = bytes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "served from origin"
        );
        Ok(TileResponse {
            bytes,
            content_type,
            cache_hit: false,
        })
    }

    async fn fetch_and_store(&self, cache: &DiskTileCache, name: &str, origin: OriginRequest<'_>) -> FetchOutcome {
        // An earlier leader may have stored the tile after our cache miss.
        if let Ok(Some(bytes)) = cache.get(name).await {
            return Ok(bytes);
        }

        let url = match origin {
            OriginRequest::Direct(url) => url,
            OriginRequest::Lookup { lookup, template, tile } => {
                lookup_token(&self.client, lookup, &tile).await?.render(template)
            }
        };

        debug!(url = %url, "fetching from origin");
        let bytes = self.client.get(&url).await?;

        if let Err(e) = cache.put(name, bytes.clone()).await {
            warn!(folder = %cache.folder().display(), name, error = %e, "failed to cache tile");
        }
        Ok(bytes)
    }
}

/// Plans the origin fetch of `tile`.
fn origin_request<'a>(server: &'a TileServerConfig, tile: &TileAddress) -> Result<OriginRequest<'a>, ProxyError> {
    let template = server
        .origin_template_at(tile.zoom())
        .ok_or_else(|| ProxyError::NoOriginUrl {
            server: server.id().to_string(),
            zoom: tile.zoom(),
        })?;

    match (tile, server.lookup_url()) {
        (TileAddress::Grid(grid), Some(lookup)) => Ok(OriginRequest::Lookup {
            lookup,
            template,
            tile: *grid,
        }),
        _ => {
            let vars = server.scheme().url_vars(tile).map_err(|source| ProxyError::BadAddress {
                server: server.id().to_string(),
                address: tile.to_string(),
                source,
            })?;
            let vars: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
            Ok(OriginRequest::Direct(template.render(&vars)))
        }
    }
}
