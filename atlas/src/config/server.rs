//! Tile server configuration.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;
use crate::cache::DiskTileCache;
use crate::geodetic::GeodeticTransform;
use crate::tile::mercator::MAX_ZOOM;
use crate::tile::{OriginUrl, SchemeKind, TileScheme, UrlTemplate};
use crate::zoom::{closest_zoom, AllowedZooms, DEFAULT_ZOOM};

/// One entry of the server list, as written in the rc file.
///
/// ```json
/// {
///   "id": "osm",
///   "title": "OpenStreetMap",
///   "folder": "cache/osm",
///   "type": "zxy",
///   "url": "https://{a|b|c}.tile.openstreetmap.org/{z}/{x}/{y}.png",
///   "zooms": {"min": 8, "max": 17},
///   "cache_size": 500000000
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub folder: Option<PathBuf>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<OriginUrl>,
    /// Token lookup service (streetmap only).
    pub lookup_url: Option<UrlTemplate>,
    /// Tile pitch in metres (streetmap only).
    pub tile_size: Option<u32>,
    pub zoom: Option<u8>,
    pub zooms: Option<AllowedZooms>,
    /// Print scale hint; 0 when unset.
    #[serde(default)]
    pub scale: f64,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub grid_lines: bool,
    #[serde(default)]
    pub os_north: bool,
    /// Cache budget in bytes; 0 when unset, meaning unlimited.
    #[serde(default)]
    pub cache_size: u64,
}

/// How a server's tiles are presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayFlags {
    /// Left out of server pickers.
    pub hidden: bool,
    /// Overlay national grid lines.
    pub grid_lines: bool,
    /// Rotate tiles to grid north.
    pub os_north: bool,
}

/// A validated tile server.
///
/// Immutable; [`with_zoom`](Self::with_zoom) yields a new value when the zoom
/// changes.
#[derive(Debug, Clone)]
pub struct TileServerConfig {
    id: String,
    title: String,
    folder: PathBuf,
    scheme: TileScheme,
    url: OriginUrl,
    lookup_url: Option<UrlTemplate>,
    zooms: AllowedZooms,
    zoom: u8,
    scale: f64,
    cache_size: u64,
    flags: DisplayFlags,
}

impl TileServerConfig {
    /// Validates an rc file entry.
    ///
    /// Relative folders are resolved against `cache_root`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnsupportedServerType`] for an unknown `type`, and
    /// [`ConfigError::MissingField`] when a required field is absent.
    pub fn from_entry(
        entry: ServerEntry,
        cache_root: &Path,
        transform: GeodeticTransform,
    ) -> Result<Self, ConfigError> {
        let kind_text = entry.kind.unwrap_or_default();
        let kind: SchemeKind = kind_text
            .parse()
            .map_err(|_| ConfigError::UnsupportedServerType(kind_text.clone()))?;

        let id = entry.id.filter(|id| !id.is_empty()).ok_or(ConfigError::MissingField {
            server: "<unnamed>".to_string(),
            field: "id",
        })?;
        let missing = |field: &'static str| ConfigError::MissingField {
            server: id.clone(),
            field,
        };

        let folder = entry.folder.ok_or_else(|| missing("folder"))?;
        let url = entry.url.ok_or_else(|| missing("url"))?;
        let lookup_url = match kind {
            SchemeKind::StreetMap => Some(entry.lookup_url.ok_or_else(|| missing("lookup_url"))?),
            _ => entry.lookup_url,
        };

        let zooms = entry.zooms.unwrap_or_else(|| AllowedZooms::implied_by(entry.zoom));
        if let Some(zoom) = entry.zoom.into_iter().chain([zooms.max()]).find(|&z| z > MAX_ZOOM) {
            return Err(ConfigError::ZoomOutOfRange {
                server: id,
                zoom,
                max: MAX_ZOOM,
            });
        }
        let zoom = closest_zoom(Some(entry.zoom.unwrap_or(DEFAULT_ZOOM) as f64), &zooms, DEFAULT_ZOOM);

        // Street-map tiles are already grid aligned.
        let flags = match kind {
            SchemeKind::StreetMap => DisplayFlags {
                hidden: entry.hidden,
                ..DisplayFlags::default()
            },
            _ => DisplayFlags {
                hidden: entry.hidden,
                grid_lines: entry.grid_lines,
                os_north: entry.os_north,
            },
        };

        Ok(Self {
            title: entry.title.unwrap_or_else(|| id.clone()),
            folder: normalize(&cache_root.join(folder)),
            scheme: TileScheme::new(kind, Some(zoom), entry.tile_size, transform),
            url,
            lookup_url,
            zooms,
            zoom,
            scale: entry.scale,
            cache_size: entry.cache_size,
            flags,
            id,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Cache folder, exclusively owned by this server.
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn scheme(&self) -> &TileScheme {
        &self.scheme
    }

    pub fn kind(&self) -> SchemeKind {
        self.scheme.kind()
    }

    pub fn zooms(&self) -> &AllowedZooms {
        &self.zooms
    }

    /// Current zoom.
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Cache budget in bytes; 0 is unlimited.
    pub fn cache_size(&self) -> u64 {
        self.cache_size
    }

    pub fn flags(&self) -> DisplayFlags {
        self.flags
    }

    pub fn lookup_url(&self) -> Option<&UrlTemplate> {
        self.lookup_url.as_ref()
    }

    /// Origin URL template for the current zoom.
    pub fn origin_template(&self) -> Option<&UrlTemplate> {
        self.origin_template_at(self.scheme.zoom())
    }

    /// Origin URL template for tiles at `zoom`.
    pub fn origin_template_at(&self, zoom: Option<u8>) -> Option<&UrlTemplate> {
        self.url.for_zoom(zoom)
    }

    /// Proxy path of a tile served by this server.
    pub fn proxy_path(&self, tile: &impl std::fmt::Display) -> String {
        format!("/tile/{}/{}", self.id, tile)
    }

    pub fn cache(&self) -> DiskTileCache {
        DiskTileCache::new(&self.folder, self.cache_size)
    }

    /// This server at the allowed zoom closest to `requested`.
    ///
    /// Borrows `self` when the zoom does not change.
    pub fn with_zoom(&self, requested: Option<f64>) -> Cow<'_, TileServerConfig> {
        let zoom = closest_zoom(requested, &self.zooms, self.zoom);
        if zoom == self.zoom {
            return Cow::Borrowed(self);
        }
        Cow::Owned(TileServerConfig {
            scheme: self.scheme.with_zoom(zoom),
            zoom,
            ..self.clone()
        })
    }
}

/// Resolves `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: &str) -> ServerEntry {
        ServerEntry {
            id: Some("osm".to_string()),
            folder: Some(PathBuf::from("osm")),
            kind: Some(kind.to_string()),
            url: Some(OriginUrl::from("https://tiles.example/{z}/{x}/{y}.png")),
            lookup_url: Some(UrlTemplate::new("https://lookup.example/?ref=%s")),
            ..ServerEntry::default()
        }
    }

    fn build(entry: ServerEntry) -> Result<TileServerConfig, ConfigError> {
        TileServerConfig::from_entry(entry, Path::new("/cache"), GeodeticTransform::national_grid())
    }

    #[test]
    fn test_defaults_without_zoom() {
        let server = build(entry("zxy")).unwrap();
        assert_eq!(server.title(), "osm");
        assert_eq!(server.folder(), Path::new("/cache/osm"));
        assert_eq!(server.zooms(), &AllowedZooms::range(8, 16));
        assert_eq!(server.zoom(), 14);
        assert_eq!(server.scheme().zoom(), Some(14));
        assert_eq!(server.cache_size(), 0);
    }

    #[test]
    fn test_single_zoom_implies_list() {
        let server = build(ServerEntry {
            zoom: Some(12),
            ..entry("quadkey")
        })
        .unwrap();
        assert_eq!(server.zooms(), &AllowedZooms::List(vec![12]));
        assert_eq!(server.zoom(), 12);
    }

    #[test]
    fn test_default_zoom_snaps_to_allowed() {
        let server = build(ServerEntry {
            zooms: AllowedZooms::list(vec![10, 16]),
            ..entry("zxy")
        })
        .unwrap();
        // 14 is closer to 16.
        assert_eq!(server.zoom(), 16);
    }

    #[test]
    fn test_rejects_zoom_beyond_mercator_limit() {
        assert!(matches!(
            build(ServerEntry { zoom: Some(24), ..entry("zxy") }),
            Err(ConfigError::ZoomOutOfRange { zoom: 24, max: 23, .. })
        ));
        assert!(matches!(
            build(ServerEntry {
                zooms: Some(AllowedZooms::range(10, 30)),
                ..entry("quadkey")
            }),
            Err(ConfigError::ZoomOutOfRange { zoom: 30, .. })
        ));
        assert_eq!(build(ServerEntry { zoom: Some(23), ..entry("tms") }).unwrap().zoom(), 23);
    }

    #[test]
    fn test_folder_is_normalized() {
        for folder in ["./osm", "osm/", "tiles/../osm", "./tiles/./../osm"] {
            let server = build(ServerEntry {
                folder: Some(PathBuf::from(folder)),
                ..entry("zxy")
            })
            .unwrap();
            assert_eq!(server.folder().as_os_str(), "/cache/osm", "{}", folder);
        }
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        assert!(matches!(
            build(entry("wms")),
            Err(ConfigError::UnsupportedServerType(t)) if t == "wms"
        ));
        assert!(matches!(
            build(ServerEntry { kind: None, ..entry("zxy") }),
            Err(ConfigError::UnsupportedServerType(_))
        ));
    }

    #[test]
    fn test_missing_fields() {
        assert!(matches!(
            build(ServerEntry { folder: None, ..entry("zxy") }),
            Err(ConfigError::MissingField { field: "folder", .. })
        ));
        assert!(matches!(
            build(ServerEntry { url: None, ..entry("zxy") }),
            Err(ConfigError::MissingField { field: "url", .. })
        ));
        assert!(matches!(
            build(ServerEntry { lookup_url: None, ..entry("streetmap") }),
            Err(ConfigError::MissingField { field: "lookup_url", .. })
        ));
        assert!(matches!(
            build(ServerEntry { id: None, ..entry("zxy") }),
            Err(ConfigError::MissingField { field: "id", .. })
        ));
    }

    #[test]
    fn test_streetmap_ignores_grid_overlays() {
        let server = build(ServerEntry {
            grid_lines: true,
            os_north: true,
            tile_size: Some(500),
            ..entry("streetmap")
        })
        .unwrap();
        assert_eq!(server.flags(), DisplayFlags::default());
        assert!(matches!(server.scheme(), TileScheme::StreetMap(s) if s.pitch() == 500));
    }

    #[test]
    fn test_with_zoom_copies_on_change() {
        let server = build(ServerEntry {
            zooms: AllowedZooms::list(vec![10, 12, 14]),
            ..entry("zxy")
        })
        .unwrap();

        assert!(matches!(server.with_zoom(None), Cow::Borrowed(_)));
        assert!(matches!(server.with_zoom(Some(14.0)), Cow::Borrowed(_)));

        let lower = server.with_zoom(Some(11.0));
        assert!(matches!(lower, Cow::Owned(_)));
        assert_eq!(lower.zoom(), 10);
        assert_eq!(lower.scheme().zoom(), Some(10));
        assert_eq!(server.zoom(), 14);
    }

    #[test]
    fn test_origin_template_follows_zoom() {
        let url: OriginUrl = serde_json::from_str(r#"{"8": "low/{z}", "13": "high/{z}"}"#).unwrap();
        let server = build(ServerEntry {
            url: Some(url),
            ..entry("zxy")
        })
        .unwrap();

        assert_eq!(server.origin_template().unwrap().as_str(), "high/{z}");
        let low = server.with_zoom(Some(9.0));
        assert_eq!(low.origin_template().unwrap().as_str(), "low/{z}");
    }

    #[test]
    fn test_entry_deserializes() {
        let entry: ServerEntry = serde_json::from_str(
            r#"{"id": "os", "folder": "os", "type": "streetmap", "url": "u/%s",
                "lookup_url": "l/%s", "tile_size": 1000, "hidden": true, "cache_size": 1024}"#,
        )
        .unwrap();
        assert_eq!(entry.kind.as_deref(), Some("streetmap"));
        assert_eq!(entry.tile_size, Some(1000));
        assert!(entry.hidden);
        assert_eq!(entry.cache_size, 1024);
        assert_eq!(entry.scale, 0.0);
    }
}
