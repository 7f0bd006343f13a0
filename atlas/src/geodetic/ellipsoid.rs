//! Reference ellipsoids and datum shifts.

/// A reference ellipsoid described by its semi-axes, in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis.
    pub a: f64,
    /// Semi-minor axis.
    pub b: f64,
}

/// Airy 1830, the ellipsoid of the OSGB36 datum.
pub const AIRY_1830: Ellipsoid = Ellipsoid {
    a: 6_377_563.396,
    b: 6_356_256.909,
};

/// WGS84 (GRS80 is identical to the millimetre).
pub const WGS84: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    b: 6_356_752.314_245,
};

impl Ellipsoid {
    /// First eccentricity squared.
    #[inline]
    pub fn e2(&self) -> f64 {
        1.0 - (self.b * self.b) / (self.a * self.a)
    }

    /// Third flattening `(a - b) / (a + b)`.
    #[inline]
    pub fn n(&self) -> f64 {
        (self.a - self.b) / (self.a + self.b)
    }

    /// Geodetic (lat, lon) in radians at zero height → earth-centred cartesian.
    pub fn to_cartesian(&self, lat: f64, lon: f64) -> [f64; 3] {
        let e2 = self.e2();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let nu = self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();

        [
            nu * cos_lat * lon.cos(),
            nu * cos_lat * lon.sin(),
            (1.0 - e2) * nu * sin_lat,
        ]
    }

    /// Earth-centred cartesian → geodetic (lat, lon) in radians.
    pub fn to_geodetic(&self, [x, y, z]: [f64; 3]) -> (f64, f64) {
        let e2 = self.e2();
        let p = x.hypot(y);

        let mut lat = z.atan2(p * (1.0 - e2));
        for _ in 0..10 {
            let sin_lat = lat.sin();
            let nu = self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
            let next = (z + e2 * nu * sin_lat).atan2(p);
            let converged = (next - lat).abs() < 1e-12;
            lat = next;
            if converged {
                break;
            }
        }

        (lat, y.atan2(x))
    }
}

/// Seven-parameter Helmert transformation between datums.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Helmert {
    /// Translations, metres.
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
    /// Scale, parts per million.
    pub s: f64,
    /// Rotations, arc seconds.
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

/// WGS84 → OSGB36, per the Ordnance Survey transformation guide.
pub const WGS84_TO_OSGB36: Helmert = Helmert {
    tx: -446.448,
    ty: 125.157,
    tz: -542.060,
    s: 20.4894,
    rx: -0.1502,
    ry: -0.2470,
    rz: -0.8421,
};

impl Helmert {
    /// The approximate inverse, valid for the small parameters of datum shifts.
    pub const fn inverse(&self) -> Helmert {
        Helmert {
            tx: -self.tx,
            ty: -self.ty,
            tz: -self.tz,
            s: -self.s,
            rx: -self.rx,
            ry: -self.ry,
            rz: -self.rz,
        }
    }

    pub fn apply(&self, [x, y, z]: [f64; 3]) -> [f64; 3] {
        let arcsec = std::f64::consts::PI / (180.0 * 3600.0);
        let (rx, ry, rz) = (self.rx * arcsec, self.ry * arcsec, self.rz * arcsec);
        let s1 = 1.0 + self.s / 1e6;

        [
            self.tx + x * s1 - y * rz + z * ry,
            self.ty + x * rz + y * s1 - z * rx,
            self.tz - x * ry + y * rx + z * s1,
        ]
    }
}
