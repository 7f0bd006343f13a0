//! The set of configured tile servers.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use super::{ConfigError, ServerEntry, TileServerConfig};
use crate::cache::DiskTileCache;
use crate::geodetic::GeodeticTransform;

/// Tile servers by id, in rc file order.
///
/// Built once at startup and never modified; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct TileServerRegistry {
    servers: Vec<TileServerConfig>,
    index: HashMap<String, usize>,
}

impl TileServerRegistry {
    /// Builds a registry from validated servers.
    ///
    /// # Errors
    ///
    /// Fails when the list is empty, when an id repeats, or when two servers
    /// share a cache folder.
    pub fn new(servers: Vec<TileServerConfig>) -> Result<Self, ConfigError> {
        if servers.is_empty() {
            return Err(ConfigError::NoServers);
        }

        let mut index = HashMap::with_capacity(servers.len());
        let mut folders: HashMap<&Path, &str> = HashMap::with_capacity(servers.len());
        for (i, server) in servers.iter().enumerate() {
            if index.insert(server.id().to_string(), i).is_some() {
                return Err(ConfigError::DuplicateId(server.id().to_string()));
            }
            if let Some(first) = folders.insert(server.folder(), server.id()) {
                return Err(ConfigError::SharedFolder {
                    folder: server.folder().to_path_buf(),
                    first: first.to_string(),
                    second: server.id().to_string(),
                });
            }
        }

        Ok(Self { servers, index })
    }

    /// Parses the rc file's JSON array of server entries.
    ///
    /// Entries with an unknown `type` are skipped with a warning; any other
    /// invalid entry fails the whole load.
    pub fn from_json(text: &str, cache_root: &Path, transform: GeodeticTransform) -> Result<Self, ConfigError> {
        let raw: Vec<serde_json::Value> =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut servers = Vec::with_capacity(raw.len());
        for (i, value) in raw.into_iter().enumerate() {
            let entry: ServerEntry = serde_json::from_value(value)
                .map_err(|e| ConfigError::Parse(format!("server entry {}: {}", i, e)))?;
            let id = entry.id.clone().unwrap_or_default();

            match TileServerConfig::from_entry(entry, cache_root, transform.clone()) {
                Ok(server) => {
                    debug!(server = %server.id(), kind = %server.kind(), zoom = server.zoom(), "configured tile server");
                    servers.push(server);
                }
                Err(ConfigError::UnsupportedServerType(kind)) => {
                    warn!(server = %id, kind = %kind, "skipping server of unsupported type");
                }
                Err(e) => return Err(e),
            }
        }

        Self::new(servers)
    }

    /// Loads the rc file at `path`.
    pub fn load(
        path: impl AsRef<Path>,
        cache_root: impl AsRef<Path>,
        transform: GeodeticTransform,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json(&text, cache_root.as_ref(), transform)?;
        info!(path = %path.display(), servers = registry.len(), "loaded tile servers");
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Option<&TileServerConfig> {
        self.index.get(id).map(|&i| &self.servers[i])
    }

    /// The first configured server.
    pub fn default_server(&self) -> &TileServerConfig {
        &self.servers[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileServerConfig> {
        self.servers.iter()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Every server's cache, keyed by server id.
    pub fn caches(&self) -> Vec<(String, DiskTileCache)> {
        self.servers.iter().map(|s| (s.id().to_string(), s.cache())).collect()
    }
}
