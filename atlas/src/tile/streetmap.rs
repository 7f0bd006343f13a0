//! Fixed-pitch national grid tiles, as served by street-map style sources.
//!
//! A tile is named by the grid coordinates of its south-west corner, floored
//! to the tile pitch. The origin server does not accept these coordinates
//! directly: a lookup service first resolves them to a provider token (see
//! [`crate::provider::StreetMapToken`]).

use std::fmt;

use super::{TileAddressing, TileError};
use crate::geodetic::{GeodeticTransform, LongLat};
use crate::vector::Vector2;

/// Default tile pitch in metres.
pub const DEFAULT_PITCH_M: u32 = 1000;

/// A grid tile: the south-west corner in grid metres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridTile {
    pub easting: i64,
    pub northing: i64,
}

impl GridTile {
    /// The tile of pitch `pitch` containing the grid point.
    pub fn containing(easting: i64, northing: i64, pitch: u32) -> Self {
        let pitch = pitch.max(1) as i64;
        Self {
            easting: easting.div_euclid(pitch) * pitch,
            northing: northing.div_euclid(pitch) * pitch,
        }
    }

    pub fn moved(&self, dx: i64, dy: i64, pitch: u32) -> GridTile {
        let pitch = pitch as i64;
        GridTile {
            easting: self.easting + dx * pitch,
            northing: self.northing + dy * pitch,
        }
    }
}

impl fmt::Display for GridTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.easting, self.northing)
    }
}

/// Grid tiling at a fixed pitch.
#[derive(Debug, Clone)]
pub struct StreetMapScheme {
    pitch: u32,
    transform: GeodeticTransform,
}

impl StreetMapScheme {
    pub fn new(pitch: u32, transform: GeodeticTransform) -> Self {
        Self {
            pitch: pitch.max(1),
            transform,
        }
    }

    /// Tile edge in metres.
    pub fn pitch(&self) -> u32 {
        self.pitch
    }
}

impl TileAddressing for StreetMapScheme {
    type Address = GridTile;

    fn geodetic(&self) -> &GeodeticTransform {
        &self.transform
    }

    fn from_long_lat(&self, ll: &LongLat) -> Result<GridTile, TileError> {
        let grid = self.transform.to_grid_exact(ll).floor();
        Ok(GridTile::containing(grid.x as i64, grid.y as i64, self.pitch))
    }

    fn to_long_lat(&self, address: &GridTile) -> LongLat {
        // Addresses name the south-west corner; report the north-west one.
        self.transform.to_long_lat(
            address.easting as f64,
            (address.northing + self.pitch as i64) as f64,
        )
    }

    fn move_by(&self, address: &GridTile, dx: i64, dy: i64) -> GridTile {
        address.moved(dx, dy, self.pitch)
    }

    fn native_point(&self, ll: &LongLat) -> Vector2 {
        self.transform.to_grid_exact(ll)
    }

    fn scale_factor_at(&self, _ll: &LongLat) -> Result<f64, TileError> {
        Ok(self.pitch as f64 / super::NOMINAL_SQUARE_M)
    }

    fn parse_address(&self, text: &str) -> Result<GridTile, TileError> {
        let invalid = || TileError::InvalidAddress {
            scheme: "streetmap",
            text: text.to_string(),
        };

        let (e, n) = text.split_once(['-', '/', ',']).ok_or_else(invalid)?;
        let easting = e.parse::<u32>().map_err(|_| invalid())? as i64;
        let northing = n.parse::<u32>().map_err(|_| invalid())? as i64;

        let tile = GridTile::containing(easting, northing, self.pitch);
        if tile.easting != easting || tile.northing != northing {
            return Err(invalid());
        }
        Ok(tile)
    }

    fn path_to_tile(&self, address: &GridTile) -> String {
        format!("{}.gif", address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme() -> StreetMapScheme {
        StreetMapScheme::new(DEFAULT_PITCH_M, GeodeticTransform::national_grid())
    }

    #[test]
    fn test_from_long_lat_floors_to_pitch() {
        let s = scheme();
        let ll = s.geodetic().to_long_lat(437_192.0, 115_651.0);
        let tile = s.from_long_lat(&ll).unwrap();
        assert_eq!(tile, GridTile { easting: 437_000, northing: 115_000 });
        assert_eq!(s.path_to_tile(&tile), "437000-115000.gif");
    }

    #[test]
    fn test_to_long_lat_is_northwest_corner() {
        let s = scheme();
        let tile = GridTile { easting: 437_000, northing: 115_000 };
        let nw = s.to_long_lat(&tile);
        assert_eq!(s.geodetic().to_grid(&nw), (437_000, 116_000));
    }

    #[test]
    fn test_move_is_integer_arithmetic() {
        let s = scheme();
        let tile = GridTile { easting: 437_000, northing: 115_000 };
        assert_eq!(s.move_by(&tile, 2, -3), GridTile { easting: 439_000, northing: 112_000 });
        assert_eq!(s.move_by(&s.move_by(&tile, 5, 5), -5, -5), tile);
    }

    #[test]
    fn test_parse_address() {
        let s = scheme();
        assert_eq!(
            s.parse_address("437000-115000").unwrap(),
            GridTile { easting: 437_000, northing: 115_000 }
        );
        assert!(s.parse_address("437192-115651").is_err());
        assert!(s.parse_address("437000").is_err());
        assert!(s.parse_address("x-y").is_err());
    }

    #[test]
    fn test_scale_factor_is_pitch_in_km() {
        let s = StreetMapScheme::new(500, GeodeticTransform::national_grid());
        let ll = s.geodetic().to_long_lat(437_192.0, 115_651.0);
        assert_eq!(s.scale_factor_at(&ll).unwrap(), 0.5);
    }

    #[test]
    fn test_proportion_in_grid_plane() {
        let s = scheme();
        let ll = s.geodetic().to_long_lat(437_250.0, 115_900.0);
        let tile = s.from_long_lat(&ll).unwrap();
        let p = s.proportion(&tile, &ll).unwrap();
        assert!((p.x - 0.25).abs() < 1e-3, "x {}", p.x);
        assert!((p.y - 0.1).abs() < 1e-3, "y {}", p.y);
    }
}
