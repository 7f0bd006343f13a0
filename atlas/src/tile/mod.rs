//! Tile addressing schemes.
//!
//! Every origin server names its tiles differently. This module puts the
//! supported conventions behind one capability trait, [`TileAddressing`]:
//!
//! | Scheme      | Address            | Native plane               |
//! |-------------|--------------------|----------------------------|
//! | `quadkey`   | base-4 digit key   | Web Mercator unit plane    |
//! | `zxy`/`tms` | `zoom/x/y`         | Web Mercator unit plane    |
//! | `streetmap` | grid SW corner     | national grid metres       |
//!
//! [`TileScheme`] is the closed set of configured schemes and dispatches on
//! its tag; [`TileAddress`] is the matching set of addresses.
//!
//! # Example
//!
//! ```ignore
//! use atlas::geodetic::GeodeticTransform;
//! use atlas::tile::{SchemeKind, TileScheme};
//!
//! let scheme = TileScheme::new(SchemeKind::Zxy, Some(14), None, GeodeticTransform::national_grid());
//! let ll = scheme.geodetic().to_long_lat(437192.0, 115651.0);
//! let tile = scheme.from_long_lat(&ll)?;
//! let east = scheme.move_by(&tile, 1, 0)?;
//! ```

pub mod mercator;
mod quadkey;
mod streetmap;
mod url;
mod zxy;

pub use quadkey::{Quadkey, QuadkeyScheme, MAX_DIGITS};
pub use streetmap::{GridTile, StreetMapScheme, DEFAULT_PITCH_M};
pub use url::{OriginUrl, UrlTemplate};
pub use zxy::{RowOrigin, ZxyScheme, ZxyTile};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::geodetic::{GeodeticTransform, LongLat};
use crate::vector::Vector2;

/// Side of the nominal grid square that scale factors are relative to.
pub const NOMINAL_SQUARE_M: f64 = 1000.0;

/// Errors from tile address arithmetic and parsing.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TileError {
    #[error("invalid {scheme} tile address '{text}'")]
    InvalidAddress { scheme: &'static str, text: String },

    #[error("invalid latitude: {0} (must be between -85.05 and 85.05)")]
    InvalidLatitude(f64),

    #[error("invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    #[error("invalid zoom level: {0}")]
    InvalidZoom(u8),

    #[error("tile {x},{y} is outside the world at zoom {zoom}")]
    OutOfRange { zoom: u8, x: u32, y: u32 },

    #[error("unknown tile scheme '{0}'")]
    UnknownScheme(String),

    #[error("{address} is not a {scheme} tile address")]
    SchemeMismatch { scheme: SchemeKind, address: String },

    #[error("tile edges are collinear; cannot locate a point inside it")]
    DegenerateTile,
}

/// Coordinate math shared by every tile scheme.
///
/// All methods are pure. `move_by` counts whole tiles, east-positive and
/// north-positive.
pub trait TileAddressing {
    type Address: Clone + PartialEq + fmt::Debug + fmt::Display;

    /// Transform to and from national grid coordinates.
    fn geodetic(&self) -> &GeodeticTransform;

    /// The tile containing `ll`.
    fn from_long_lat(&self, ll: &LongLat) -> Result<Self::Address, TileError>;

    /// The tile's north-west (top-left) corner.
    fn to_long_lat(&self, address: &Self::Address) -> LongLat;

    fn move_by(&self, address: &Self::Address, dx: i64, dy: i64) -> Self::Address;

    /// Position of `ll` in the plane where this scheme's tiles are
    /// parallelograms.
    fn native_point(&self, ll: &LongLat) -> Vector2;

    fn parse_address(&self, text: &str) -> Result<Self::Address, TileError>;

    /// Cache file name of the tile.
    fn path_to_tile(&self, address: &Self::Address) -> String;

    /// Top-left, top-right and bottom-left corners.
    fn corners(&self, address: &Self::Address) -> [LongLat; 3] {
        [
            self.to_long_lat(address),
            self.to_long_lat(&self.move_by(address, 1, 0)),
            self.to_long_lat(&self.move_by(address, 0, -1)),
        ]
    }

    /// Where `ll` sits inside the tile, as multiples of the tile's east edge
    /// and south edge measured from the top-left corner.
    ///
    /// Points inside the tile give components in `[0, 1)`.
    fn proportion(&self, address: &Self::Address, ll: &LongLat) -> Result<Vector2, TileError> {
        let [tl, tr, bl] = self.corners(address);
        let origin = self.native_point(&tl);
        let east = self.native_point(&tr) - origin;
        let south = self.native_point(&bl) - origin;

        (self.native_point(ll) - origin)
            .as_linear_combination(east, south)
            .ok_or(TileError::DegenerateTile)
    }

    /// Grid distance spanned by the top edge of the tile at `ll`, in units of
    /// the nominal 1 km square.
    fn scale_factor_at(&self, ll: &LongLat) -> Result<f64, TileError> {
        let address = self.from_long_lat(ll)?;
        let [tl, tr, _] = self.corners(&address);
        let grid = self.geodetic();
        let edge = grid.to_grid_exact(&tr) - grid.to_grid_exact(&tl);
        Ok(edge.length() / NOMINAL_SQUARE_M)
    }
}

/// Rotation, in radians, from the tile's vertical axis to grid north at
/// `ll`, measured over one `square`-metre grid cell.
///
/// Zero when grid north points straight up the tile.
pub fn grid_north_angle<S: TileAddressing + ?Sized>(
    scheme: &S,
    address: &S::Address,
    ll: &LongLat,
    square: u32,
) -> Result<f64, TileError> {
    let grid = scheme.geodetic();
    let south = scheme.proportion(address, &grid.corner_of(ll, 0, 0, square))?;
    let north = scheme.proportion(address, &grid.corner_of(ll, 0, 1, square))?;
    Ok((south - north).angle_from_vertical())
}

/// The kinds of origin server understood by the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeKind {
    Quadkey,
    Zxy,
    Tms,
    StreetMap,
}

impl SchemeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeKind::Quadkey => "quadkey",
            SchemeKind::Zxy => "zxy",
            SchemeKind::Tms => "tms",
            SchemeKind::StreetMap => "streetmap",
        }
    }

    /// MIME type of the images served by this kind of origin.
    pub fn content_type(&self) -> &'static str {
        match self {
            SchemeKind::StreetMap => "image/gif",
            _ => "image/jpeg",
        }
    }

    /// Whether tiles are Web Mercator rather than national grid aligned.
    pub fn is_mercator(&self) -> bool {
        !matches!(self, SchemeKind::StreetMap)
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemeKind {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quadkey" => Ok(SchemeKind::Quadkey),
            "zxy" => Ok(SchemeKind::Zxy),
            "tms" => Ok(SchemeKind::Tms),
            "streetmap" => Ok(SchemeKind::StreetMap),
            _ => Err(TileError::UnknownScheme(s.to_string())),
        }
    }
}

/// An address in any scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileAddress {
    Quadkey(Quadkey),
    Zxy(ZxyTile),
    Grid(GridTile),
}

impl TileAddress {
    /// Zoom level of a Mercator address.
    pub fn zoom(&self) -> Option<u8> {
        match self {
            TileAddress::Quadkey(q) => Some(q.zoom()),
            TileAddress::Zxy(t) => Some(t.zoom),
            TileAddress::Grid(_) => None,
        }
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileAddress::Quadkey(q) => fmt::Display::fmt(q, f),
            TileAddress::Zxy(t) => fmt::Display::fmt(t, f),
            TileAddress::Grid(g) => fmt::Display::fmt(g, f),
        }
    }
}

impl From<Quadkey> for TileAddress {
    fn from(q: Quadkey) -> Self {
        TileAddress::Quadkey(q)
    }
}

impl From<ZxyTile> for TileAddress {
    fn from(t: ZxyTile) -> Self {
        TileAddress::Zxy(t)
    }
}

impl From<GridTile> for TileAddress {
    fn from(g: GridTile) -> Self {
        TileAddress::Grid(g)
    }
}

/// A configured tile scheme.
#[derive(Debug, Clone)]
pub enum TileScheme {
    Quadkey(QuadkeyScheme),
    Zxy(ZxyScheme),
    Tms(ZxyScheme),
    StreetMap(StreetMapScheme),
}

/// Runs `$body` with the concrete scheme and address, or fails with
/// [`TileError::SchemeMismatch`] when the address belongs to another scheme.
macro_rules! dispatch {
    ($scheme:expr, $address:expr, |$s:ident, $a:ident| $body:expr) => {
        match ($scheme, $address) {
            (TileScheme::Quadkey($s), TileAddress::Quadkey($a)) => Ok($body),
            (TileScheme::Zxy($s) | TileScheme::Tms($s), TileAddress::Zxy($a)) => Ok($body),
            (TileScheme::StreetMap($s), TileAddress::Grid($a)) => Ok($body),
            (scheme, address) => Err(TileError::SchemeMismatch {
                scheme: scheme.kind(),
                address: address.to_string(),
            }),
        }
    };
}

impl TileScheme {
    /// Builds a scheme of the given kind.
    ///
    /// Mercator schemes use `zoom` (default 14); the street-map scheme uses
    /// `pitch` metres (default [`DEFAULT_PITCH_M`]).
    pub fn new(kind: SchemeKind, zoom: Option<u8>, pitch: Option<u32>, transform: GeodeticTransform) -> Self {
        let zoom = zoom.unwrap_or(crate::zoom::DEFAULT_ZOOM);
        match kind {
            SchemeKind::Quadkey => TileScheme::Quadkey(QuadkeyScheme::new(zoom, transform)),
            SchemeKind::Zxy => TileScheme::Zxy(ZxyScheme::new(zoom, RowOrigin::North, transform)),
            SchemeKind::Tms => TileScheme::Tms(ZxyScheme::new(zoom, RowOrigin::South, transform)),
            SchemeKind::StreetMap => {
                TileScheme::StreetMap(StreetMapScheme::new(pitch.unwrap_or(DEFAULT_PITCH_M), transform))
            }
        }
    }

    pub fn kind(&self) -> SchemeKind {
        match self {
            TileScheme::Quadkey(_) => SchemeKind::Quadkey,
            TileScheme::Zxy(_) => SchemeKind::Zxy,
            TileScheme::Tms(_) => SchemeKind::Tms,
            TileScheme::StreetMap(_) => SchemeKind::StreetMap,
        }
    }

    /// Zoom level of a Mercator scheme.
    pub fn zoom(&self) -> Option<u8> {
        match self {
            TileScheme::Quadkey(s) => Some(s.zoom()),
            TileScheme::Zxy(s) | TileScheme::Tms(s) => Some(s.zoom()),
            TileScheme::StreetMap(_) => None,
        }
    }

    /// The same scheme at another zoom. Street-map tiling has no zoom and is
    /// returned unchanged.
    pub fn with_zoom(&self, zoom: u8) -> TileScheme {
        let transform = self.geodetic().clone();
        match self {
            TileScheme::Quadkey(_) => TileScheme::Quadkey(QuadkeyScheme::new(zoom, transform)),
            TileScheme::Zxy(s) => TileScheme::Zxy(ZxyScheme::new(zoom, s.rows(), transform)),
            TileScheme::Tms(s) => TileScheme::Tms(ZxyScheme::new(zoom, s.rows(), transform)),
            TileScheme::StreetMap(_) => self.clone(),
        }
    }

    pub fn geodetic(&self) -> &GeodeticTransform {
        match self {
            TileScheme::Quadkey(s) => s.geodetic(),
            TileScheme::Zxy(s) | TileScheme::Tms(s) => s.geodetic(),
            TileScheme::StreetMap(s) => s.geodetic(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        self.kind().content_type()
    }

    pub fn from_long_lat(&self, ll: &LongLat) -> Result<TileAddress, TileError> {
        match self {
            TileScheme::Quadkey(s) => s.from_long_lat(ll).map(Into::into),
            TileScheme::Zxy(s) | TileScheme::Tms(s) => s.from_long_lat(ll).map(Into::into),
            TileScheme::StreetMap(s) => s.from_long_lat(ll).map(Into::into),
        }
    }

    pub fn to_long_lat(&self, address: &TileAddress) -> Result<LongLat, TileError> {
        dispatch!(self, address, |s, a| s.to_long_lat(a))
    }

    pub fn move_by(&self, address: &TileAddress, dx: i64, dy: i64) -> Result<TileAddress, TileError> {
        dispatch!(self, address, |s, a| TileAddress::from(s.move_by(a, dx, dy)))
    }

    pub fn proportion(&self, address: &TileAddress, ll: &LongLat) -> Result<Vector2, TileError> {
        dispatch!(self, address, |s, a| s.proportion(a, ll)?)
    }

    pub fn scale_factor_at(&self, ll: &LongLat) -> Result<f64, TileError> {
        match self {
            TileScheme::Quadkey(s) => s.scale_factor_at(ll),
            TileScheme::Zxy(s) | TileScheme::Tms(s) => s.scale_factor_at(ll),
            TileScheme::StreetMap(s) => s.scale_factor_at(ll),
        }
    }

    pub fn grid_north_angle(&self, address: &TileAddress, ll: &LongLat, square: u32) -> Result<f64, TileError> {
        dispatch!(self, address, |s, a| grid_north_angle(s, a, ll, square)?)
    }

    pub fn parse_address(&self, text: &str) -> Result<TileAddress, TileError> {
        match self {
            TileScheme::Quadkey(s) => s.parse_address(text).map(Into::into),
            TileScheme::Zxy(s) | TileScheme::Tms(s) => s.parse_address(text).map(Into::into),
            TileScheme::StreetMap(s) => s.parse_address(text).map(Into::into),
        }
    }

    pub fn path_to_tile(&self, address: &TileAddress) -> Result<String, TileError> {
        dispatch!(self, address, |s, a| s.path_to_tile(a))
    }

    /// Variables substituted into the origin URL template of a Mercator
    /// scheme, in positional order.
    ///
    /// Street-map tiles need a provider token instead and yield no
    /// variables.
    pub fn url_vars(&self, address: &TileAddress) -> Result<Vec<(&'static str, String)>, TileError> {
        match (self, address) {
            (TileScheme::Quadkey(_), TileAddress::Quadkey(q)) => {
                let key = q.to_string();
                Ok(vec![("quadkey", key.clone()), ("q", key)])
            }
            (TileScheme::Zxy(s) | TileScheme::Tms(s), TileAddress::Zxy(t)) => Ok(vec![
                ("z", t.zoom.to_string()),
                ("x", t.x.to_string()),
                ("y", s.url_y(t).to_string()),
            ]),
            (TileScheme::StreetMap(_), TileAddress::Grid(_)) => Ok(Vec::new()),
            (scheme, address) => Err(TileError::SchemeMismatch {
                scheme: scheme.kind(),
                address: address.to_string(),
            }),
        }
    }
}
