//! Map projections for wind maps.
//!
//! Implements the projections from scratch without external dependencies:
//! equirectangular (`cyl`), Mercator (`merc`) and Lambert conformal conic
//! (`lcc`). A [`MapProjection`] is built for a geographic region and maps
//! between lon/lat degrees and projected metres centred on that region.

pub mod geographic;
pub mod lambert;
pub mod mercator;

use std::fmt;
use std::str::FromStr;

use jet_common::BoundingBox;
use thiserror::Error;

pub use geographic::Equirectangular;
pub use lambert::LambertConformal;
pub use mercator::Mercator;

/// Spherical earth radius (meters), as used by the reanalysis grids.
pub const EARTH_RADIUS: f64 = 6371229.0;

/// Bring a longitude difference into [-180, 180].
///
/// Values within rounding of +/-180 keep their sign, so both edges of a
/// full-globe region stay on their own side of the map.
pub fn normalize_dlon(mut dlon: f64) -> f64 {
    while dlon > 180.0 + 1e-9 {
        dlon -= 360.0;
    }
    while dlon < -180.0 - 1e-9 {
        dlon += 360.0;
    }
    dlon
}

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Unknown projection '{0}' (expected cyl, merc or lcc)")]
    UnknownProjection(String),

    #[error("Invalid projection parameters: {0}")]
    InvalidParameters(String),

    #[error("Region cannot be drawn with this projection: {0}")]
    UnsupportedExtent(String),
}

/// Projection names accepted on the command line and in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionKind {
    #[default]
    Cyl,
    Merc,
    Lcc,
}

impl FromStr for ProjectionKind {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cyl" | "equirectangular" | "platecarree" => Ok(Self::Cyl),
            "merc" | "mercator" => Ok(Self::Merc),
            "lcc" | "lambert" => Ok(Self::Lcc),
            other => Err(ProjectionError::UnknownProjection(other.to_string())),
        }
    }
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cyl => "cyl",
            Self::Merc => "merc",
            Self::Lcc => "lcc",
        })
    }
}

#[derive(Debug, Clone)]
enum Inner {
    Cyl(Equirectangular),
    Merc(Mercator),
    Lcc(LambertConformal),
}

/// A projection fitted to a region, with the region's projected bounds.
#[derive(Debug, Clone)]
pub struct MapProjection {
    kind: ProjectionKind,
    inner: Inner,
    region: BoundingBox,
    /// Projected bounds (min_x, min_y, max_x, max_y) in metres.
    bounds: (f64, f64, f64, f64),
}

/// Samples per region edge when computing projected bounds.
const EDGE_SAMPLES: usize = 64;

impl MapProjection {
    /// Fit a projection to `region` (lon/lat degrees; longitudes may use
    /// either the -180..180 or the 0..360 convention).
    pub fn for_region(kind: ProjectionKind, region: &BoundingBox) -> Result<Self, ProjectionError> {
        if region.width() <= 0.0 || region.height() <= 0.0 || region.width() > 360.0 {
            return Err(ProjectionError::UnsupportedExtent(format!(
                "empty or oversized region {:?}",
                region
            )));
        }
        let lon0 = (region.min_x + region.max_x) / 2.0;
        let inner = match kind {
            ProjectionKind::Cyl => Inner::Cyl(Equirectangular::new(lon0)),
            ProjectionKind::Merc => {
                if region.min_y >= mercator::MAX_LATITUDE
                    || region.max_y <= -mercator::MAX_LATITUDE
                {
                    return Err(ProjectionError::UnsupportedExtent(
                        "region lies entirely poleward of the Mercator limit".to_string(),
                    ));
                }
                Inner::Merc(Mercator::new(lon0))
            }
            ProjectionKind::Lcc => Inner::Lcc(LambertConformal::for_extent(
                region.min_x,
                region.min_y,
                region.max_x,
                region.max_y,
            )?),
        };

        let mut proj = Self {
            kind,
            inner,
            region: *region,
            bounds: (0.0, 0.0, 0.0, 0.0),
        };
        proj.bounds = proj.compute_bounds();
        Ok(proj)
    }

    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    pub fn region(&self) -> &BoundingBox {
        &self.region
    }

    /// Projected bounds (min_x, min_y, max_x, max_y) of the region.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.bounds
    }

    /// Width / height of the projected region.
    pub fn aspect_ratio(&self) -> f64 {
        let (x0, y0, x1, y1) = self.bounds;
        (x1 - x0) / (y1 - y0)
    }

    /// Geographic degrees to projected metres.
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        match &self.inner {
            Inner::Cyl(p) => p.forward(lon, lat),
            Inner::Merc(p) => p.forward(lon, lat),
            Inner::Lcc(p) => p.forward(lon, lat),
        }
    }

    /// Projected metres to geographic degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        match &self.inner {
            Inner::Cyl(p) => p.inverse(x, y),
            Inner::Merc(p) => p.inverse(x, y),
            Inner::Lcc(p) => p.inverse(x, y),
        }
    }

    /// Whether a geographic point lies inside the region.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        if lat < self.region.min_y - 1e-9 || lat > self.region.max_y + 1e-9 {
            return false;
        }
        let mut offset = lon - self.region.min_x;
        while offset < 0.0 {
            offset += 360.0;
        }
        while offset >= 360.0 {
            offset -= 360.0;
        }
        offset <= self.region.width() + 1e-9
    }

    /// Project the region outline and take its envelope.
    fn compute_bounds(&self) -> (f64, f64, f64, f64) {
        let r = &self.region;
        let mut min_x = f64::MAX;
        let mut max_x = f64::MIN;
        let mut min_y = f64::MAX;
        let mut max_y = f64::MIN;

        let lon0 = (r.min_x + r.max_x) / 2.0;
        let half = r.width() / 2.0;
        for t in 0..=EDGE_SAMPLES {
            let frac = t as f64 / EDGE_SAMPLES as f64;
            let lon = lon0 - half + frac * r.width();
            let lat = r.min_y + frac * r.height();
            let points = [
                (lon, r.min_y),
                (lon, r.max_y),
                (lon0 - half, lat),
                (lon0 + half, lat),
            ];
            for (lon, lat) in points {
                let (x, y) = self.forward(lon, lat);
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }

        (min_x, min_y, max_x, max_y)
    }
}
