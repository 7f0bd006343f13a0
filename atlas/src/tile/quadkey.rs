//! Bing-style quadkey addressing.
//!
//! A quadkey is a string of base-4 digits, one per zoom level. Each digit
//! packs one bit of the tile column (bit 0) and one bit of the tile row
//! (bit 1), most significant level first, so the zoom is the key length.
//!
//! Moving to a neighbour flips the axis bit of the last digit and carries
//! into the parent digit whenever the flip crosses a power-of-two boundary.
//! Carrying past the root wraps around the world.

use std::fmt;
use std::str::FromStr;

use super::{mercator, TileAddressing, TileError};
use crate::geodetic::{GeodeticTransform, LongLat};
use crate::vector::Vector2;

/// Deepest quadkey supported.
pub const MAX_DIGITS: usize = 23;

const X_BIT: u8 = 0b01;
const Y_BIT: u8 = 0b10;

/// A quadtree tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quadkey {
    digits: [u8; MAX_DIGITS],
    len: u8,
}

impl Quadkey {
    /// The quadkey of tile `(x, y)` at `zoom`.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidZoom`] past [`MAX_DIGITS`] and
    /// [`TileError::OutOfRange`] when `x` or `y` is not a tile at that zoom.
    pub fn from_tile(x: u32, y: u32, zoom: u8) -> Result<Self, TileError> {
        if zoom as usize > MAX_DIGITS {
            return Err(TileError::InvalidZoom(zoom));
        }
        let n = mercator::tiles_per_axis(zoom);
        if x >= n || y >= n {
            return Err(TileError::OutOfRange { zoom, x, y });
        }

        let mut digits = [0u8; MAX_DIGITS];
        for (level, digit) in digits.iter_mut().take(zoom as usize).enumerate() {
            let shift = zoom as usize - 1 - level;
            let x_bit = ((x >> shift) & 1) as u8;
            let y_bit = ((y >> shift) & 1) as u8;
            *digit = x_bit | (y_bit << 1);
        }

        Ok(Self { digits, len: zoom })
    }

    /// Tile column and row.
    pub fn to_tile(&self) -> (u32, u32) {
        self.digits().iter().fold((0u32, 0u32), |(x, y), &d| {
            ((x << 1) | (d & X_BIT) as u32, (y << 1) | ((d & Y_BIT) >> 1) as u32)
        })
    }

    pub fn zoom(&self) -> u8 {
        self.len
    }

    pub fn digits(&self) -> &[u8] {
        &self.digits[..self.len as usize]
    }

    /// Moves one tile along the axis selected by `bit`.
    ///
    /// Walks from the last digit towards the root, flipping `bit`. Moving
    /// forward stops at the first digit whose bit was clear; moving backward
    /// stops at the first digit whose bit was set.
    fn step(&mut self, bit: u8, backward: bool) {
        for digit in self.digits[..self.len as usize].iter_mut().rev() {
            let was_clear = *digit & bit == 0;
            *digit ^= bit;
            if was_clear != backward {
                break;
            }
        }
    }

    fn step_axis(&mut self, bit: u8, steps: i64) {
        // A full lap returns to the start, so only the remainder matters.
        let lap = mercator::tiles_per_axis(self.len) as i64;
        let count = steps.unsigned_abs() % lap as u64;
        for _ in 0..count {
            self.step(bit, steps < 0);
        }
    }

    /// The tile `dx` columns east and `dy` rows north of this one.
    pub fn moved(&self, dx: i64, dy: i64) -> Quadkey {
        let mut next = *self;
        next.step_axis(X_BIT, dx);
        // Rows count southwards.
        next.step_axis(Y_BIT, -dy);
        next
    }

    /// Top-left, top-right and bottom-left corners.
    pub fn corners(&self) -> [LongLat; 3] {
        let (x, y) = self.to_tile();
        mercator::tile_corners(x, y, self.len)
    }
}

impl fmt::Display for Quadkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in self.digits() {
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

impl FromStr for Quadkey {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TileError::InvalidAddress {
            scheme: "quadkey",
            text: s.to_string(),
        };

        if s.len() > MAX_DIGITS {
            return Err(invalid());
        }

        let mut digits = [0u8; MAX_DIGITS];
        for (slot, c) in digits.iter_mut().zip(s.chars()) {
            *slot = match c {
                '0'..='3' => c as u8 - b'0',
                _ => return Err(invalid()),
            };
        }

        Ok(Self {
            digits,
            len: s.len() as u8,
        })
    }
}

/// Quadkey tiling at a fixed zoom.
#[derive(Debug, Clone)]
pub struct QuadkeyScheme {
    zoom: u8,
    transform: GeodeticTransform,
}

impl QuadkeyScheme {
    pub fn new(zoom: u8, transform: GeodeticTransform) -> Self {
        Self { zoom, transform }
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }
}

impl TileAddressing for QuadkeyScheme {
    type Address = Quadkey;

    fn geodetic(&self) -> &GeodeticTransform {
        &self.transform
    }

    fn from_long_lat(&self, ll: &LongLat) -> Result<Quadkey, TileError> {
        let (x, y) = mercator::tile_at(ll, self.zoom)?;
        Quadkey::from_tile(x, y, self.zoom)
    }

    fn to_long_lat(&self, address: &Quadkey) -> LongLat {
        address.corners()[0]
    }

    fn move_by(&self, address: &Quadkey, dx: i64, dy: i64) -> Quadkey {
        address.moved(dx, dy)
    }

    fn corners(&self, address: &Quadkey) -> [LongLat; 3] {
        address.corners()
    }

    fn native_point(&self, ll: &LongLat) -> Vector2 {
        mercator::to_unit_plane(ll)
    }

    fn parse_address(&self, text: &str) -> Result<Quadkey, TileError> {
        text.parse()
    }

    fn path_to_tile(&self, address: &Quadkey) -> String {
        format!("{}.jpg", address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Quadkey {
        s.parse().unwrap()
    }

    #[test]
    fn test_known_tile() {
        // Example from the Bing Maps tile system documentation.
        let q = Quadkey::from_tile(3, 5, 3).unwrap();
        assert_eq!(q.to_string(), "213");
        assert_eq!(q.to_tile(), (3, 5));
        assert_eq!(q.zoom(), 3);
    }

    #[test]
    fn test_parse_rejects_bad_digits() {
        assert!("0124".parse::<Quadkey>().is_err());
        assert!("01a".parse::<Quadkey>().is_err());
        assert!("0".repeat(MAX_DIGITS + 1).parse::<Quadkey>().is_err());
    }

    #[test]
    fn test_empty_key_is_the_world() {
        let root = key("");
        assert_eq!(root.zoom(), 0);
        assert_eq!(root.moved(5, -3), root);
    }

    #[test]
    fn test_move_east_without_carry() {
        assert_eq!(key("120").moved(1, 0), key("121"));
    }

    #[test]
    fn test_move_east_carries_into_parent() {
        // 121 is the east half of its parent; its east neighbour is in 130.
        assert_eq!(key("121").moved(1, 0), key("130"));
        assert_eq!(key("0111").moved(1, 0), key("1000"));
    }

    #[test]
    fn test_move_west_borrows_from_parent() {
        assert_eq!(key("130").moved(-1, 0), key("121"));
    }

    #[test]
    fn test_move_north_and_south() {
        // Row increases southwards: 2 is directly south of 0.
        assert_eq!(key("2").moved(0, 1), key("0"));
        assert_eq!(key("0").moved(0, -1), key("2"));
        assert_eq!(key("02").moved(0, -1), key("20"));
    }

    #[test]
    fn test_move_wraps_at_the_root() {
        assert_eq!(key("11").moved(1, 0), key("00"));
        assert_eq!(key("00").moved(-1, 0), key("11"));
        assert_eq!(key("00").moved(0, 1), key("22"));
    }

    #[test]
    fn test_move_matches_tile_arithmetic() {
        let q = Quadkey::from_tile(100, 200, 10).unwrap();
        let moved = q.moved(7, -4);
        assert_eq!(moved.to_tile(), (107, 204));
    }

    #[test]
    fn test_large_moves_are_reduced() {
        let q = Quadkey::from_tile(1, 1, 2).unwrap();
        assert_eq!(q.moved(4_000_000_001, 0), q.moved(1, 0));
    }

    #[test]
    fn test_scheme_from_long_lat() {
        let scheme = QuadkeyScheme::new(3, GeodeticTransform::national_grid());
        let q = scheme
            .from_long_lat(&LongLat::new(-1.4, 50.9))
            .unwrap();
        assert_eq!(q.zoom(), 3);
        assert_eq!(q.to_tile(), (3, 2));
        assert_eq!(scheme.path_to_tile(&q), format!("{}.jpg", q));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_move_is_reversible(
                zoom in 1u8..=MAX_DIGITS as u8,
                fx in 0.0..1.0_f64,
                fy in 0.0..1.0_f64,
                dx in -50i64..50,
                dy in -50i64..50
            ) {
                let n = mercator::tiles_per_axis(zoom);
                let x = ((fx * n as f64) as u32).min(n - 1);
                let y = ((fy * n as f64) as u32).min(n - 1);
                let a = Quadkey::from_tile(x, y, zoom)?;

                prop_assert_eq!(a.moved(dx, dy).moved(-dx, -dy), a);
                prop_assert_eq!(a.moved(3, -2).moved(-3, 2), a);
            }

            #[test]
            fn test_tile_roundtrip(zoom in 0u8..=16, fx in 0.0..1.0_f64, fy in 0.0..1.0_f64) {
                let n = mercator::tiles_per_axis(zoom);
                let x = ((fx * n as f64) as u32).min(n - 1);
                let y = ((fy * n as f64) as u32).min(n - 1);
                let q = Quadkey::from_tile(x, y, zoom)?;
                prop_assert_eq!(q.to_tile(), (x, y));
                prop_assert_eq!(q.to_string().parse::<Quadkey>()?, q);
            }
        }
    }
}
