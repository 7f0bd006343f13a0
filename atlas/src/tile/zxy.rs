//! Slippy-map `(zoom, x, y)` addressing, with its TMS flavour.

use std::fmt;
use std::str::FromStr;

use super::{mercator, TileAddressing, TileError};
use crate::geodetic::{GeodeticTransform, LongLat};
use crate::vector::Vector2;

/// A Web Mercator tile; `y` counts southwards from the top of the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZxyTile {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl ZxyTile {
    /// # Errors
    ///
    /// Returns [`TileError::InvalidZoom`] past [`mercator::MAX_ZOOM`] and
    /// [`TileError::OutOfRange`] for a column or row outside the world.
    pub fn new(zoom: u8, x: u32, y: u32) -> Result<Self, TileError> {
        if zoom > mercator::MAX_ZOOM {
            return Err(TileError::InvalidZoom(zoom));
        }
        let n = mercator::tiles_per_axis(zoom);
        if x >= n || y >= n {
            return Err(TileError::OutOfRange { zoom, x, y });
        }
        Ok(Self { zoom, x, y })
    }

    /// The row as counted by TMS servers, from the bottom of the world.
    pub fn tms_y(&self) -> u32 {
        mercator::tiles_per_axis(self.zoom) - 1 - self.y
    }

    /// The tile `dx` columns east and `dy` rows north, wrapping at the edges.
    pub fn moved(&self, dx: i64, dy: i64) -> ZxyTile {
        let n = mercator::tiles_per_axis(self.zoom) as i64;
        ZxyTile {
            zoom: self.zoom,
            x: (self.x as i64 + dx).rem_euclid(n) as u32,
            y: (self.y as i64 - dy).rem_euclid(n) as u32,
        }
    }

    pub fn corners(&self) -> [LongLat; 3] {
        mercator::tile_corners(self.x, self.y, self.zoom)
    }
}

impl fmt::Display for ZxyTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

impl FromStr for ZxyTile {
    type Err = TileError;

    /// Parses `z/x/y`; `-` is accepted as the separator too, matching the
    /// cache file names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TileError::InvalidAddress {
            scheme: "zxy",
            text: s.to_string(),
        };

        let mut parts = s.split(['/', '-']);
        let mut next = || -> Result<&str, TileError> { parts.next().ok_or_else(invalid) };
        let zoom = next()?.parse::<u8>().map_err(|_| invalid())?;
        let x = next()?.parse::<u32>().map_err(|_| invalid())?;
        let y = next()?.parse::<u32>().map_err(|_| invalid())?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        ZxyTile::new(zoom, x, y)
    }
}

/// Row convention of a `(zoom, x, y)` origin server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrigin {
    /// Rows count from the north (OpenStreetMap and most slippy maps).
    North,
    /// Rows count from the south (TMS).
    South,
}

/// ZXY or TMS tiling at a fixed zoom.
///
/// Both flavours share addresses and cache names; the row origin only
/// changes the `{y}` substituted into origin URLs.
#[derive(Debug, Clone)]
pub struct ZxyScheme {
    zoom: u8,
    rows: RowOrigin,
    transform: GeodeticTransform,
}

impl ZxyScheme {
    pub fn new(zoom: u8, rows: RowOrigin, transform: GeodeticTransform) -> Self {
        Self {
            zoom,
            rows,
            transform,
        }
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn rows(&self) -> RowOrigin {
        self.rows
    }

    /// The row to put in an origin URL.
    pub fn url_y(&self, tile: &ZxyTile) -> u32 {
        match self.rows {
            RowOrigin::North => tile.y,
            RowOrigin::South => tile.tms_y(),
        }
    }
}

impl TileAddressing for ZxyScheme {
    type Address = ZxyTile;

    fn geodetic(&self) -> &GeodeticTransform {
        &self.transform
    }

    fn from_long_lat(&self, ll: &LongLat) -> Result<ZxyTile, TileError> {
        let (x, y) = mercator::tile_at(ll, self.zoom)?;
        ZxyTile::new(self.zoom, x, y)
    }

    fn to_long_lat(&self, address: &ZxyTile) -> LongLat {
        address.corners()[0]
    }

    fn move_by(&self, address: &ZxyTile, dx: i64, dy: i64) -> ZxyTile {
        address.moved(dx, dy)
    }

    fn corners(&self, address: &ZxyTile) -> [LongLat; 3] {
        address.corners()
    }

    fn native_point(&self, ll: &LongLat) -> Vector2 {
        mercator::to_unit_plane(ll)
    }

    fn parse_address(&self, text: &str) -> Result<ZxyTile, TileError> {
        text.parse()
    }

    fn path_to_tile(&self, address: &ZxyTile) -> String {
        format!("{}-{}-{}.jpg", address.zoom, address.x, address.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme(rows: RowOrigin) -> ZxyScheme {
        ZxyScheme::new(12, rows, GeodeticTransform::national_grid())
    }

    #[test]
    fn test_parse_and_display() {
        let tile: ZxyTile = "12/2031/1358".parse().unwrap();
        assert_eq!(tile, ZxyTile::new(12, 2031, 1358).unwrap());
        assert_eq!(tile.to_string(), "12/2031/1358");
        assert_eq!("12-2031-1358".parse::<ZxyTile>().unwrap(), tile);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "12/2031", "12/2031/1358/4", "a/b/c", "2/4/0", "40/0/0"] {
            assert!(bad.parse::<ZxyTile>().is_err(), "{} should not parse", bad);
        }
    }

    #[test]
    fn test_tms_row_flip() {
        let tile = ZxyTile::new(3, 1, 0).unwrap();
        assert_eq!(tile.tms_y(), 7);
        assert_eq!(scheme(RowOrigin::South).url_y(&tile), 7);
        assert_eq!(scheme(RowOrigin::North).url_y(&tile), 0);
    }

    #[test]
    fn test_move_is_north_positive_and_wraps() {
        let tile = ZxyTile::new(2, 0, 1).unwrap();
        assert_eq!(tile.moved(0, 1), ZxyTile::new(2, 0, 0).unwrap());
        assert_eq!(tile.moved(-1, 0), ZxyTile::new(2, 3, 1).unwrap());
        assert_eq!(tile.moved(0, 2), ZxyTile::new(2, 0, 3).unwrap());
    }

    #[test]
    fn test_path_to_tile() {
        let s = scheme(RowOrigin::North);
        let tile = ZxyTile::new(12, 2031, 1358).unwrap();
        assert_eq!(s.path_to_tile(&tile), "12-2031-1358.jpg");
    }

    #[test]
    fn test_tms_and_zxy_share_addresses() {
        let ll = LongLat::new(-1.4, 50.9);
        let a = scheme(RowOrigin::North).from_long_lat(&ll).unwrap();
        let b = scheme(RowOrigin::South).from_long_lat(&ll).unwrap();
        assert_eq!(a, b);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_tms_y_flips(zoom in 0u8..=mercator::MAX_ZOOM, fy in 0.0..1.0_f64) {
                let n = mercator::tiles_per_axis(zoom);
                let y = ((fy * n as f64) as u32).min(n - 1);
                let tile = ZxyTile::new(zoom, 0, y)?;
                prop_assert_eq!(tile.tms_y(), (1u32 << zoom) - 1 - y);
            }

            #[test]
            fn test_move_is_reversible(
                zoom in 0u8..=18,
                fx in 0.0..1.0_f64,
                fy in 0.0..1.0_f64,
                dx in -1000i64..1000,
                dy in -1000i64..1000
            ) {
                let n = mercator::tiles_per_axis(zoom);
                let x = ((fx * n as f64) as u32).min(n - 1);
                let y = ((fy * n as f64) as u32).min(n - 1);
                let tile = ZxyTile::new(zoom, x, y)?;
                prop_assert_eq!(tile.moved(dx, dy).moved(-dx, -dy), tile);
            }
        }
    }
}
