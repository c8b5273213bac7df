//! Equirectangular (plate carrée) projection.

use crate::{normalize_dlon, EARTH_RADIUS};

/// Cylindrical equidistant projection: x and y are proportional to
/// longitude and latitude.
#[derive(Debug, Clone)]
pub struct Equirectangular {
    /// Central meridian in degrees
    pub lon0: f64,
}

impl Equirectangular {
    pub fn new(lon0: f64) -> Self {
        Self { lon0 }
    }

    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let x = EARTH_RADIUS * normalize_dlon(lon - self.lon0).to_radians();
        let y = EARTH_RADIUS * lat.to_radians();
        (x, y)
    }

    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.lon0 + (x / EARTH_RADIUS).to_degrees(),
            (y / EARTH_RADIUS).to_degrees(),
        )
    }
}
