//! Geographic positions.

use std::fmt;

use crate::vector::Vector2;

/// Mean earth radius in metres, used by the spherical helpers.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const RAD_PER_DEG: f64 = std::f64::consts::PI / 180.0;

/// A WGS84 (longitude, latitude) pair in degrees.
///
/// Values are only produced by a projection (see
/// [`GeodeticTransform`](super::GeodeticTransform) and the Mercator tile
/// schemes), never assembled by hand outside the crate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongLat {
    lon: f64,
    lat: f64,
}

impl LongLat {
    pub(crate) const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// The pair as a vector, longitude first.
    pub fn as_vector(&self) -> Vector2 {
        Vector2::new(self.lon, self.lat)
    }

    /// Great-circle (haversine) distance to `other`, in metres.
    pub fn distance_to(&self, other: &LongLat) -> f64 {
        let a_lat = self.lat * RAD_PER_DEG;
        let b_lat = other.lat * RAD_PER_DEG;
        let d_lat = b_lat - a_lat;
        let d_lon = (other.lon - self.lon) * RAD_PER_DEG;

        let h = (d_lat / 2.0).sin().powi(2) + a_lat.cos() * b_lat.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Moves east then north by the given number of metres on a sphere.
    pub fn offset_by(&self, east_m: f64, north_m: f64) -> LongLat {
        let lon = self.lon + (east_m / EARTH_RADIUS_M) / RAD_PER_DEG / (self.lat * RAD_PER_DEG).cos();
        let lat = self.lat + (north_m / EARTH_RADIUS_M) / RAD_PER_DEG;
        LongLat::new(lon, lat)
    }
}

impl fmt::Display for LongLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lon, self.lat)
    }
}
