//! Two-dimensional vector arithmetic.
//!
//! [`Vector2`] is the shared currency of the geometry code: grid coordinates,
//! Web Mercator plane positions, tile-local proportions and page offsets are
//! all carried as a pair of `f64`s with pointwise operators.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A pair of `f64` components with pointwise arithmetic.
///
/// Binary operators accept either another vector (pointwise) or a scalar
/// (applied to both components).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    /// The origin.
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector with both components set to `v`.
    #[inline]
    pub const fn splat(v: f64) -> Self {
        Self { x: v, y: v }
    }

    /// Applies `f` to each component.
    #[inline]
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.x), f(self.y))
    }

    #[inline]
    pub fn floor(self) -> Self {
        self.map(f64::floor)
    }

    #[inline]
    pub fn ceil(self) -> Self {
        self.map(f64::ceil)
    }

    #[inline]
    pub fn round(self) -> Self {
        self.map(f64::round)
    }

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Slope `y / x`.
    #[inline]
    pub fn gradient(self) -> f64 {
        self.y / self.x
    }

    /// Angle from the positive x axis, in radians.
    #[inline]
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Angle from the positive y axis, in radians (clockwise positive).
    ///
    /// Used to derive how far a tile's vertical edge is rotated from
    /// grid north.
    #[inline]
    pub fn angle_from_vertical(self) -> f64 {
        self.x.atan2(self.y)
    }

    /// Expresses `self` as `a * horizontal + b * vertical`, returning `(a, b)`.
    ///
    /// Solves the 2×2 system `[h v] · [a b]ᵀ = self` with the closed-form
    /// inverse. Returns `None` when the basis vectors are collinear.
    pub fn as_linear_combination(self, horizontal: Vector2, vertical: Vector2) -> Option<Vector2> {
        let (h, v) = (horizontal, vertical);
        let det = h.x * v.y - h.y * v.x;
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        // [h v]⁻¹ = 1/det · [[ v.y, -v.x], [-h.y, h.x]]
        Some(Vector2::new(
            (v.y * self.x - v.x * self.y) / det,
            (h.x * self.y - h.y * self.x) / det,
        ))
    }

    /// Returns `true` if both components are within `epsilon` of `other`.
    pub fn approx_eq(self, other: Vector2, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(f64, f64)> for Vector2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<Vector2> for (f64, f64) {
    fn from(v: Vector2) -> Self {
        (v.x, v.y)
    }
}

macro_rules! pointwise {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait for Vector2 {
            type Output = Vector2;

            #[inline]
            fn $method(self, rhs: Vector2) -> Vector2 {
                Vector2::new(self.x $op rhs.x, self.y $op rhs.y)
            }
        }

        impl $trait<f64> for Vector2 {
            type Output = Vector2;

            #[inline]
            fn $method(self, rhs: f64) -> Vector2 {
                Vector2::new(self.x $op rhs, self.y $op rhs)
            }
        }
    };
}

pointwise!(Add, add, +);
pointwise!(Sub, sub, -);
pointwise!(Mul, mul, *);
pointwise!(Div, div, /);

impl Mul<Vector2> for f64 {
    type Output = Vector2;

    #[inline]
    fn mul(self, rhs: Vector2) -> Vector2 {
        rhs * self
    }
}

impl Neg for Vector2 {
    type Output = Vector2;

    #[inline]
    fn neg(self) -> Vector2 {
        Vector2::new(-self.x, -self.y)
    }
}

impl AddAssign for Vector2 {
    #[inline]
    fn add_assign(&mut self, rhs: Vector2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vector2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vector2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointwise_operators() {
        let a = Vector2::new(3.0, 4.0);
        let b = Vector2::new(1.0, 2.0);

        assert_eq!(a + b, Vector2::new(4.0, 6.0));
        assert_eq!(a - b, Vector2::new(2.0, 2.0));
        assert_eq!(a * b, Vector2::new(3.0, 8.0));
        assert_eq!(a / b, Vector2::new(3.0, 2.0));
        assert_eq!(a * 2.0, Vector2::new(6.0, 8.0));
        assert_eq!(2.0 * a, Vector2::new(6.0, 8.0));
        assert_eq!(-a, Vector2::new(-3.0, -4.0));
    }

    #[test]
    fn test_rounding_is_pointwise() {
        let v = Vector2::new(1.5, -1.5);
        assert_eq!(v.floor(), Vector2::new(1.0, -2.0));
        assert_eq!(v.ceil(), Vector2::new(2.0, -1.0));
        assert_eq!(v.round(), Vector2::new(2.0, -2.0));
    }

    #[test]
    fn test_length() {
        assert_eq!(Vector2::new(3.0, 4.0).length(), 5.0);
    }

    #[test]
    fn test_angles() {
        let east = Vector2::new(1.0, 0.0);
        let north = Vector2::new(0.0, 1.0);

        assert_eq!(east.angle(), 0.0);
        assert!((north.angle() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(north.angle_from_vertical(), 0.0);
        assert!((east.angle_from_vertical() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_linear_combination_orthogonal_basis() {
        let p = Vector2::new(3.0, -2.0);
        let result = p
            .as_linear_combination(Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0))
            .unwrap();
        assert!(result.approx_eq(p, 1e-12));
    }

    #[test]
    fn test_linear_combination_skewed_basis() {
        let h = Vector2::new(2.0, 1.0);
        let v = Vector2::new(-1.0, 3.0);
        let p = h * 0.25 + v * 0.75;

        let result = p.as_linear_combination(h, v).unwrap();
        assert!(result.approx_eq(Vector2::new(0.25, 0.75), 1e-12));
    }

    #[test]
    fn test_linear_combination_collinear_basis() {
        let h = Vector2::new(1.0, 1.0);
        let v = Vector2::new(2.0, 2.0);
        assert!(Vector2::new(1.0, 0.0).as_linear_combination(h, v).is_none());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_linear_combination_reconstructs_point(
                hx in 0.5..10.0_f64,
                hy in -0.4..0.4_f64,
                vx in -0.4..0.4_f64,
                vy in -10.0..-0.5_f64,
                a in -5.0..5.0_f64,
                b in -5.0..5.0_f64,
            ) {
                let h = Vector2::new(hx, hy);
                let v = Vector2::new(vx, vy);
                let p = h * a + v * b;

                let coefficients = p.as_linear_combination(h, v).unwrap();
                let rebuilt = h * coefficients.x + v * coefficients.y;

                prop_assert!(rebuilt.approx_eq(p, 1e-9), "{} != {}", rebuilt, p);
            }
        }
    }
}
