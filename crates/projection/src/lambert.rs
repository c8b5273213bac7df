//! Lambert Conformal Conic projection.
//!
//! Maps a cone secant to the Earth's surface onto a flat plane. Used for
//! mid-latitude regional maps, where it keeps shapes true along the two
//! standard parallels.
//!
//! The projection parameters include:
//! - Reference latitude (lat0): latitude of the origin
//! - Central meridian (lon0)
//! - Standard parallels: latin1 and latin2 (can be equal for a tangent cone)

use std::f64::consts::PI;

use crate::{normalize_dlon, ProjectionError, EARTH_RADIUS};

/// Lambert Conformal Conic projection parameters.
#[derive(Debug, Clone)]
pub struct LambertConformal {
    /// Central meridian in radians
    pub lon0: f64,
    /// Latitude of the origin in radians
    pub lat0: f64,
    /// First standard parallel in radians
    pub latin1: f64,
    /// Second standard parallel in radians
    pub latin2: f64,
    /// Cone constant (n)
    n: f64,
    /// F constant
    f: f64,
    /// Rho at the origin latitude
    rho0: f64,
}

impl LambertConformal {
    /// Create a projection from its parameters in degrees.
    pub fn new(
        lat0_deg: f64,
        lon0_deg: f64,
        latin1_deg: f64,
        latin2_deg: f64,
    ) -> Result<Self, ProjectionError> {
        let to_rad = PI / 180.0;

        let lat0 = lat0_deg * to_rad;
        let lon0 = lon0_deg * to_rad;
        let latin1 = latin1_deg * to_rad;
        let latin2 = latin2_deg * to_rad;

        if latin1.abs() >= PI / 2.0 || latin2.abs() >= PI / 2.0 {
            return Err(ProjectionError::InvalidParameters(
                "standard parallels must lie strictly between the poles".to_string(),
            ));
        }

        // Compute cone constant n
        let n = if (latin1 - latin2).abs() < 1e-10 {
            // Tangent cone (single standard parallel)
            latin1.sin()
        } else {
            // Secant cone (two standard parallels)
            let ln_ratio = (latin1.cos() / latin2.cos()).ln();
            let tan_ratio =
                ((PI / 4.0 + latin2 / 2.0).tan() / (PI / 4.0 + latin1 / 2.0).tan()).ln();
            ln_ratio / tan_ratio
        };
        if !n.is_finite() || n.abs() < 1e-3 {
            return Err(ProjectionError::InvalidParameters(format!(
                "standard parallels {:.1} and {:.1} give a degenerate cone",
                latin1_deg, latin2_deg
            )));
        }

        let f = (latin1.cos() * (PI / 4.0 + latin1 / 2.0).tan().powf(n)) / n;
        let rho0 = EARTH_RADIUS * f / (PI / 4.0 + lat0 / 2.0).tan().powf(n);

        Ok(Self {
            lon0,
            lat0,
            latin1,
            latin2,
            n,
            f,
            rho0,
        })
    }

    /// Projection for a lat/lon box: origin at its center, standard parallels
    /// at one sixth and five sixths of its latitude span.
    ///
    /// Boxes straddling the equator or reaching a pole cannot be drawn with
    /// a conic projection.
    pub fn for_extent(
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> Result<Self, ProjectionError> {
        if max_lat >= 89.0 || min_lat <= -89.0 {
            return Err(ProjectionError::UnsupportedExtent(
                "Lambert conformal maps cannot reach the poles".to_string(),
            ));
        }
        if min_lat < 0.0 && max_lat > 0.0 {
            return Err(ProjectionError::UnsupportedExtent(
                "Lambert conformal maps cannot straddle the equator".to_string(),
            ));
        }
        let span = max_lat - min_lat;
        let latin1 = min_lat + span / 6.0;
        let latin2 = max_lat - span / 6.0;
        Self::new(
            (min_lat + max_lat) / 2.0,
            (min_lon + max_lon) / 2.0,
            latin1,
            latin2,
        )
    }

    /// Cone constant.
    pub fn cone_constant(&self) -> f64 {
        self.n
    }

    /// Geographic (degrees) to projected metres, origin at (lon0, lat0).
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let lat = lat_deg.clamp(-89.999, 89.999) * to_rad;
        let dlon = normalize_dlon(lon_deg - self.lon0.to_degrees()) * to_rad;

        let rho = EARTH_RADIUS * self.f / (PI / 4.0 + lat / 2.0).tan().powf(self.n);
        let theta = self.n * dlon;

        let x = rho * theta.sin();
        let y = self.rho0 - rho * theta.cos();
        (x, y)
    }

    /// Projected metres to geographic degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let to_deg = 180.0 / PI;
        let sign = self.n.signum();

        let dy = self.rho0 - y;
        let rho = sign * (x * x + dy * dy).sqrt();
        let theta = (sign * x).atan2(sign * dy);

        let lat = if rho == 0.0 {
            sign * PI / 2.0
        } else {
            2.0 * ((EARTH_RADIUS * self.f / rho).powf(1.0 / self.n)).atan() - PI / 2.0
        };
        let lon = self.lon0 + theta / self.n;

        (lon * to_deg, lat * to_deg)
    }
}
