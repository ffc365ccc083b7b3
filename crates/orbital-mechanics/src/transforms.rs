//! Earth-fixed Cartesian to geodetic coordinates on a reference ellipsoid

use serde::{Deserialize, Serialize};

const MAX_ITERATIONS: usize = 10;
const LATITUDE_TOLERANCE_RAD: f64 = 1e-12;

/// Reference ellipsoid (kilometres)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    pub semi_major_axis_km: f64,
    pub flattening: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major_axis_km: 6378.137,
        flattening: 1.0 / 298.257223563,
    };
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPoint {
    /// Degrees east, (-180, 180]
    pub longitude: f64,
    /// Degrees north, [-90, 90]
    pub latitude: f64,
    pub altitude_km: f64,
}

/// Geodetic conversion with the ellipsoid's derived constants computed once.
///
/// Holds no mutable state; one instance can serve any number of calls.
#[derive(Debug, Clone, Copy)]
pub struct GeodeticTransform {
    a: f64,
    b: f64,
    e2: f64,
}

impl GeodeticTransform {
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        let a = ellipsoid.semi_major_axis_km;
        let f = ellipsoid.flattening;
        Self {
            a,
            b: a * (1.0 - f),
            e2: f * (2.0 - f),
        }
    }

    pub fn wgs84() -> Self {
        Self::new(Ellipsoid::WGS84)
    }

    /// Radius of curvature in the prime vertical
    fn prime_vertical_radius(&self, lat: f64) -> f64 {
        self.a / (1.0 - self.e2 * lat.sin().powi(2)).sqrt()
    }

    /// Earth-fixed (x, y, z) in km to longitude/latitude/altitude
    pub fn to_geodetic(&self, x: f64, y: f64, z: f64) -> GeodeticPoint {
        let p = x.hypot(y);
        let longitude = y.atan2(x).to_degrees();

        if p < 1e-9 {
            // On the polar axis
            return GeodeticPoint {
                longitude: 0.0,
                latitude: 90.0_f64.copysign(z),
                altitude_km: z.abs() - self.b,
            };
        }

        let mut lat = z.atan2(p * (1.0 - self.e2));
        for _ in 0..MAX_ITERATIONS {
            let n = self.prime_vertical_radius(lat);
            let alt = p / lat.cos() - n;
            let next = z.atan2(p * (1.0 - self.e2 * n / (n + alt)));
            let done = (next - lat).abs() < LATITUDE_TOLERANCE_RAD;
            lat = next;
            if done {
                break;
            }
        }

        let altitude_km = p * lat.cos() + z * lat.sin()
            - self.a * (1.0 - self.e2 * lat.sin().powi(2)).sqrt();

        GeodeticPoint {
            longitude,
            latitude: lat.to_degrees(),
            altitude_km,
        }
    }

    /// Inverse of [`to_geodetic`](Self::to_geodetic)
    pub fn to_ecef(&self, point: &GeodeticPoint) -> (f64, f64, f64) {
        let lat = point.latitude.to_radians();
        let lon = point.longitude.to_radians();
        let n = self.prime_vertical_radius(lat);
        let alt = point.altitude_km;

        let x = (n + alt) * lat.cos() * lon.cos();
        let y = (n + alt) * lat.cos() * lon.sin();
        let z = (n * (1.0 - self.e2) + alt) * lat.sin();

        (x, y, z)
    }
}

impl Default for GeodeticTransform {
    fn default() -> Self {
        Self::wgs84()
    }
}
