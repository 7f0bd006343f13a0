//! Transverse Mercator projection using the Ordnance Survey series expansion.

use super::ellipsoid::Ellipsoid;

/// Iteration tolerance of the inverse meridional arc, metres.
const MERIDIAN_TOLERANCE_M: f64 = 1e-5;

/// Upper bound on inverse meridional arc iterations.
const MAX_MERIDIAN_ITERATIONS: usize = 100;

/// A Transverse Mercator projection on a given ellipsoid.
///
/// All angles are radians; eastings and northings are metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    pub ellipsoid: Ellipsoid,
    /// Scale factor on the central meridian.
    pub scale: f64,
    /// Latitude of the true origin.
    pub lat0: f64,
    /// Longitude of the true origin (the central meridian).
    pub lon0: f64,
    /// Easting of the true origin.
    pub false_easting: f64,
    /// Northing of the true origin.
    pub false_northing: f64,
}

impl TransverseMercator {
    /// Developed meridional arc from `lat0` to `lat`, scaled.
    fn meridional_arc(&self, lat: f64) -> f64 {
        let b = self.ellipsoid.b;
        let n = self.ellipsoid.n();
        let (n2, n3) = (n * n, n * n * n);
        let (dl, sl) = (lat - self.lat0, lat + self.lat0);

        let ma = (1.0 + n + 1.25 * n2 + 1.25 * n3) * dl;
        let mb = (3.0 * n + 3.0 * n2 + 2.625 * n3) * dl.sin() * sl.cos();
        let mc = (1.875 * n2 + 1.875 * n3) * (2.0 * dl).sin() * (2.0 * sl).cos();
        let md = (35.0 / 24.0) * n3 * (3.0 * dl).sin() * (3.0 * sl).cos();

        b * self.scale * (ma - mb + mc - md)
    }

    /// Radii of curvature (nu, rho) and eta² at latitude `lat`.
    fn curvature(&self, lat: f64) -> (f64, f64, f64) {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let sin2 = lat.sin().powi(2);
        let nu = a * self.scale / (1.0 - e2 * sin2).sqrt();
        let rho = a * self.scale * (1.0 - e2) / (1.0 - e2 * sin2).powf(1.5);
        (nu, rho, nu / rho - 1.0)
    }

    /// (lon, lat) → (easting, northing).
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (nu, rho, eta2) = self.curvature(lat);
        let m = self.meridional_arc(lat);

        let cos3 = cos_lat.powi(3);
        let cos5 = cos_lat.powi(5);
        let tan2 = lat.tan().powi(2);
        let tan4 = tan2 * tan2;

        let i = m + self.false_northing;
        let ii = nu / 2.0 * sin_lat * cos_lat;
        let iii = nu / 24.0 * sin_lat * cos3 * (5.0 - tan2 + 9.0 * eta2);
        let iii_a = nu / 720.0 * sin_lat * cos5 * (61.0 - 58.0 * tan2 + tan4);
        let iv = nu * cos_lat;
        let v = nu / 6.0 * cos3 * (nu / rho - tan2);
        let vi = nu / 120.0 * cos5 * (5.0 - 18.0 * tan2 + tan4 + 14.0 * eta2 - 58.0 * tan2 * eta2);

        let dl = lon - self.lon0;
        let northing = i + ii * dl.powi(2) + iii * dl.powi(4) + iii_a * dl.powi(6);
        let easting = self.false_easting + iv * dl + v * dl.powi(3) + vi * dl.powi(5);

        (easting, northing)
    }

    /// (easting, northing) → (lon, lat).
    ///
    /// Non-finite input yields NaN coordinates.
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        if !easting.is_finite() || !northing.is_finite() {
            return (f64::NAN, f64::NAN);
        }
        let a = self.ellipsoid.a;

        let mut lat = self.lat0;
        let mut m = 0.0;
        for _ in 0..MAX_MERIDIAN_ITERATIONS {
            lat += (northing - self.false_northing - m) / (a * self.scale);
            m = self.meridional_arc(lat);
            if (northing - self.false_northing - m).abs() < MERIDIAN_TOLERANCE_M {
                break;
            }
        }

        let (nu, rho, eta2) = self.curvature(lat);
        let tan = lat.tan();
        let (tan2, tan4) = (tan * tan, tan.powi(4));
        let tan6 = tan4 * tan2;
        let sec = 1.0 / lat.cos();
        let (nu3, nu5, nu7) = (nu.powi(3), nu.powi(5), nu.powi(7));

        let vii = tan / (2.0 * rho * nu);
        let viii = tan / (24.0 * rho * nu3) * (5.0 + 3.0 * tan2 + eta2 - 9.0 * tan2 * eta2);
        let ix = tan / (720.0 * rho * nu5) * (61.0 + 90.0 * tan2 + 45.0 * tan4);
        let x = sec / nu;
        let xi = sec / (6.0 * nu3) * (nu / rho + 2.0 * tan2);
        let xii = sec / (120.0 * nu5) * (5.0 + 28.0 * tan2 + 24.0 * tan4);
        let xii_a = sec / (5040.0 * nu7) * (61.0 + 662.0 * tan2 + 1320.0 * tan4 + 720.0 * tan6);

        let de = easting - self.false_easting;
        let lat = lat - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
        let lon = self.lon0 + x * de - xi * de.powi(3) + xii * de.powi(5) - xii_a * de.powi(7);

        (lon, lat)
    }
}
