//! Coordinates and geodesic distance
//!
//! Distances use Vincenty's inverse formula on the WGS-84 ellipsoid. For
//! nearly antipodal points, where the iteration does not converge, the
//! spherical haversine distance is used instead.

use serde::{Deserialize, Serialize};

/// WGS-84 semi-major axis (m)
const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 flattening
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// Mean earth radius (km) for the haversine fallback
const MEAN_RADIUS_KM: f64 = 6_371.008_8;

const MAX_ITERATIONS: usize = 200;
const CONVERGENCE: f64 = 1e-12;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build from optional parts; incomplete positions yield `None`
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        match (lat, lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some(Self { lat, lon }),
            _ => None,
        }
    }

    /// Parse a WKT literal `Point(<lon> <lat>)`
    pub fn from_wkt_point(literal: &str) -> Option<Self> {
        let inner = literal
            .trim()
            .strip_prefix("Point(")?
            .strip_suffix(')')?;
        let mut parts = inner.split_whitespace();
        let lon = parts.next()?.parse::<f64>().ok()?;
        let lat = parts.next()?.parse::<f64>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { lat, lon })
    }

    /// Geodesic distance in kilometers
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        vincenty_km(self, other).unwrap_or_else(|| haversine_km(self, other))
    }
}

fn vincenty_km(p1: &Coordinate, p2: &Coordinate) -> Option<f64> {
    let b = (1.0 - WGS84_F) * WGS84_A;
    let l = (p2.lon - p1.lon).to_radians();
    let u1 = ((1.0 - WGS84_F) * p1.lat.to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * p2.lat.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            // coincident points
            return Some(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // equatorial line: cos_sq_alpha = 0
        let cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };
        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

        if lambda.abs() > std::f64::consts::PI {
            return None;
        }

        if (lambda - previous).abs() < CONVERGENCE {
            let u_sq = cos_sq_alpha * (WGS84_A.powi(2) - b.powi(2)) / b.powi(2);
            let big_a =
                1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = big_b
                * sin_sigma
                * (cos_2sigma_m
                    + big_b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                            - big_b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma.powi(2))
                                * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));
            let meters = b * big_a * (sigma - delta_sigma);
            return Some(meters / 1000.0);
        }
    }

    None
}

fn haversine_km(p1: &Coordinate, p2: &Coordinate) -> f64 {
    let d_lat = (p2.lat - p1.lat).to_radians();
    let d_lon = (p2.lon - p1.lon).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + p1.lat.to_radians().cos() * p2.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * MEAN_RADIUS_KM * a.sqrt().asin()
}
