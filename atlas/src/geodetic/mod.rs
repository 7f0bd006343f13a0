//! Conversion between national grid coordinates and WGS84 longitude/latitude.
//!
//! The [`GeodeticTransform`] is the only place grid metres meet geographic
//! degrees. It wraps a [`GridProjection`], treated as a black box; the
//! built-in [`NationalGrid`] implements the Ordnance Survey National Grid
//! (OSGB36 Transverse Mercator on the Airy 1830 ellipsoid, with a Helmert
//! datum shift from WGS84).
//!
//! # Example
//!
//! ```ignore
//! use atlas::geodetic::GeodeticTransform;
//!
//! let transform = GeodeticTransform::national_grid();
//! let ll = transform.to_long_lat(437192.0, 115651.0);
//! assert_eq!(transform.to_grid(&ll), (437192, 115651));
//! ```

mod ellipsoid;
mod long_lat;
mod transverse_mercator;

pub use ellipsoid::{Ellipsoid, Helmert, AIRY_1830, WGS84, WGS84_TO_OSGB36};
pub use long_lat::{LongLat, EARTH_RADIUS_M};
pub use transverse_mercator::TransverseMercator;

use std::fmt;
use std::sync::Arc;

use crate::vector::Vector2;

/// OSGB36 National Grid projection parameters.
pub const NATIONAL_GRID_PROJECTION: TransverseMercator = TransverseMercator {
    ellipsoid: AIRY_1830,
    scale: 0.999_601_271_7,
    lat0: 49.0 * std::f64::consts::PI / 180.0,
    lon0: -2.0 * std::f64::consts::PI / 180.0,
    false_easting: 400_000.0,
    false_northing: -100_000.0,
};

/// A projection between a rectangular grid (metres) and WGS84 degrees.
///
/// Implementations must be pure; the transform may be shared across tasks.
pub trait GridProjection: Send + Sync {
    /// Grid (easting, northing) → WGS84 (lon, lat) degrees.
    fn to_wgs84(&self, easting: f64, northing: f64) -> (f64, f64);

    /// WGS84 (lon, lat) degrees → grid (easting, northing).
    fn from_wgs84(&self, lon: f64, lat: f64) -> (f64, f64);
}

/// The Ordnance Survey National Grid.
///
/// Accurate to a few metres, which is the accuracy of the single Helmert
/// transformation between the datums.
#[derive(Debug, Clone, Copy, Default)]
pub struct NationalGrid;

impl GridProjection for NationalGrid {
    fn to_wgs84(&self, easting: f64, northing: f64) -> (f64, f64) {
        let (lon, lat) = NATIONAL_GRID_PROJECTION.inverse(easting, northing);
        let xyz = AIRY_1830.to_cartesian(lat, lon);
        let (lat, lon) = WGS84.to_geodetic(WGS84_TO_OSGB36.inverse().apply(xyz));
        (lon.to_degrees(), lat.to_degrees())
    }

    fn from_wgs84(&self, lon: f64, lat: f64) -> (f64, f64) {
        let xyz = WGS84.to_cartesian(lat.to_radians(), lon.to_radians());
        let (lat, lon) = AIRY_1830.to_geodetic(WGS84_TO_OSGB36.apply(xyz));
        NATIONAL_GRID_PROJECTION.forward(lon, lat)
    }
}

/// Converts between grid coordinates and [`LongLat`]s.
///
/// Cheap to clone; the projection is shared.
#[derive(Clone)]
pub struct GeodeticTransform {
    projection: Arc<dyn GridProjection>,
}

impl fmt::Debug for GeodeticTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeodeticTransform").finish_non_exhaustive()
    }
}

impl Default for GeodeticTransform {
    fn default() -> Self {
        Self::national_grid()
    }
}

impl GeodeticTransform {
    /// Creates a transform backed by the given projection.
    pub fn new(projection: Arc<dyn GridProjection>) -> Self {
        Self { projection }
    }

    /// Creates a transform for the OSGB36 National Grid.
    pub fn national_grid() -> Self {
        Self::new(Arc::new(NationalGrid))
    }

    /// Grid coordinates → longitude/latitude.
    pub fn to_long_lat(&self, easting: f64, northing: f64) -> LongLat {
        let (lon, lat) = self.projection.to_wgs84(easting, northing);
        LongLat::new(lon, lat)
    }

    /// Longitude/latitude → grid coordinates, rounded to the nearest metre.
    pub fn to_grid(&self, ll: &LongLat) -> (i64, i64) {
        let v = self.to_grid_exact(ll).round();
        (v.x as i64, v.y as i64)
    }

    /// Longitude/latitude → unrounded grid coordinates.
    pub fn to_grid_exact(&self, ll: &LongLat) -> Vector2 {
        self.projection.from_wgs84(ll.lon(), ll.lat()).into()
    }

    /// A corner of the grid square of side `square` (metres) containing `ll`.
    ///
    /// The grid position is floored to a multiple of `square`, then offset by
    /// `(dx, dy)` whole squares: `(0, 0)` is the south-west corner, `(1, 1)`
    /// the north-east one.
    pub fn corner_of(&self, ll: &LongLat, dx: i64, dy: i64, square: u32) -> LongLat {
        let square = square.max(1) as i64;
        let (easting, northing) = self.to_grid(ll);
        let corner_e = (easting.div_euclid(square) + dx) * square;
        let corner_n = (northing.div_euclid(square) + dy) * square;
        self.to_long_lat(corner_e as f64, corner_n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_roundtrip_is_exact_to_the_metre() {
        let t = GeodeticTransform::national_grid();
        for &(e, n) in &[(437192, 115651), (530000, 180000), (216600, 771200), (651410, 313177)] {
            let ll = t.to_long_lat(e as f64, n as f64);
            assert_eq!(t.to_grid(&ll), (e, n));
        }
    }

    #[test]
    fn test_known_location() {
        // Trafalgar Square is at roughly 51.508°N, 0.128°W.
        let t = GeodeticTransform::national_grid();
        let ll = t.to_long_lat(530_000.0, 180_500.0);
        assert!((ll.lat() - 51.508).abs() < 0.01, "lat {}", ll.lat());
        assert!((ll.lon() + 0.128).abs() < 0.01, "lon {}", ll.lon());
    }

    #[test]
    fn test_datum_shift_is_applied() {
        // Without the Helmert shift the result would be ~100 m out.
        let t = GeodeticTransform::national_grid();
        let (lon, lat) = NATIONAL_GRID_PROJECTION.inverse(530_000.0, 180_000.0);
        let osgb = LongLat::new(lon.to_degrees(), lat.to_degrees());
        let wgs = t.to_long_lat(530_000.0, 180_000.0);
        let shift = osgb.distance_to(&wgs);
        assert!(shift > 50.0 && shift < 200.0, "shift {}", shift);
    }

    #[test]
    fn test_non_finite_grid_coordinates_give_nan() {
        let t = GeodeticTransform::national_grid();
        for n in [f64::NAN, f64::INFINITY] {
            let ll = t.to_long_lat(400_000.0, n);
            assert!(ll.lon().is_nan() && ll.lat().is_nan(), "{}", ll);
        }
    }

    #[test]
    fn test_corner_of() {
        let t = GeodeticTransform::national_grid();
        let ll = t.to_long_lat(437_192.0, 115_651.0);

        let sw = t.corner_of(&ll, 0, 0, 1000);
        assert_eq!(t.to_grid(&sw), (437_000, 115_000));

        let ne = t.corner_of(&ll, 1, 1, 1000);
        assert_eq!(t.to_grid(&ne), (438_000, 116_000));

        let coarse = t.corner_of(&ll, -1, 0, 10_000);
        assert_eq!(t.to_grid(&coarse), (420_000, 110_000));
    }
}
