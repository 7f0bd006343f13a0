//! Web Mercator projection shared by the quadkey and ZXY schemes.
//!
//! Positions are expressed in the *unit plane*: `x` runs from 0 at 180°W to
//! 1 at 180°E and `y` from 0 at the northern clip latitude to 1 at the
//! southern one. At zoom `z` a tile spans `1 / 2^z` of the plane on each axis.

use std::f64::consts::PI;

use super::TileError;
use crate::geodetic::LongLat;
use crate::vector::Vector2;

/// Web Mercator valid latitude range.
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range.
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Deepest zoom level supported by the Mercator schemes.
pub const MAX_ZOOM: u8 = 23;

/// Projects to the unit plane, clamping latitude to the Mercator range.
#[inline]
pub fn to_unit_plane(ll: &LongLat) -> Vector2 {
    let lat_rad = ll.lat().clamp(MIN_LAT, MAX_LAT).to_radians();
    Vector2::new(
        (ll.lon() + 180.0) / 360.0,
        (1.0 - lat_rad.tan().asinh() / PI) / 2.0,
    )
}

/// Inverse of [`to_unit_plane`].
#[inline]
pub fn from_unit_plane(v: Vector2) -> LongLat {
    let lon = v.x * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * v.y)).sinh().atan();
    LongLat::new(lon, lat_rad.to_degrees())
}

/// Number of tiles along each axis at `zoom`.
#[inline]
pub fn tiles_per_axis(zoom: u8) -> u32 {
    1u32 << zoom
}

/// Finds the (x, y) tile containing `ll` at `zoom`.
///
/// # Errors
///
/// Rejects latitudes outside the Mercator range, longitudes outside
/// [-180, 180] and zooms deeper than [`MAX_ZOOM`].
pub fn tile_at(ll: &LongLat, zoom: u8) -> Result<(u32, u32), TileError> {
    if !(MIN_LAT..=MAX_LAT).contains(&ll.lat()) {
        return Err(TileError::InvalidLatitude(ll.lat()));
    }
    if !(MIN_LON..=MAX_LON).contains(&ll.lon()) {
        return Err(TileError::InvalidLongitude(ll.lon()));
    }
    if zoom > MAX_ZOOM {
        return Err(TileError::InvalidZoom(zoom));
    }

    let n = tiles_per_axis(zoom);
    let p = to_unit_plane(ll) * n as f64;

    // 180°E and the southern clip latitude fall on the far edge; keep them
    // in the last tile.
    let x = (p.x as u32).min(n - 1);
    let y = (p.y as u32).min(n - 1);
    Ok((x, y))
}

/// Longitude/latitude of a point given in tile units at `zoom`.
///
/// Integral inputs give tile corners: `(x, y)` is the north-west corner of
/// tile `(x, y)`.
#[inline]
pub fn tile_point(x: f64, y: f64, zoom: u8) -> LongLat {
    let n = tiles_per_axis(zoom) as f64;
    from_unit_plane(Vector2::new(x / n, y / n))
}

/// Top-left, top-right and bottom-left corners of tile `(x, y)`.
pub fn tile_corners(x: u32, y: u32, zoom: u8) -> [LongLat; 3] {
    let (x, y) = (x as f64, y as f64);
    [
        tile_point(x, y, zoom),
        tile_point(x + 1.0, y, zoom),
        tile_point(x, y + 1.0, zoom),
    ]
}
