//! Spherical Mercator projection.

use std::f64::consts::PI;

use crate::{normalize_dlon, EARTH_RADIUS};

/// Latitude limit; Mercator diverges at the poles.
pub const MAX_LATITUDE: f64 = 85.0;

/// Mercator centred on a meridian.
#[derive(Debug, Clone)]
pub struct Mercator {
    /// Central meridian in degrees
    pub lon0: f64,
}

impl Mercator {
    pub fn new(lon0: f64) -> Self {
        Self { lon0 }
    }

    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = EARTH_RADIUS * normalize_dlon(lon - self.lon0).to_radians();
        let y = EARTH_RADIUS * (PI / 4.0 + lat / 2.0).tan().ln();
        (x, y)
    }

    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = self.lon0 + (x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        (lon, lat)
    }
}
