//! Bounding box types and named map regions.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in degrees.
///
/// `min_x`/`max_x` are the west/east longitudes and `min_y`/`max_y` the
/// south/north latitudes. Longitudes may use either the -180..180 or the
/// 0..360 convention; a box crossing the antimeridian is written in 0..360
/// (e.g. `120,-60,240,60`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a "west,south,east,north" string.
    pub fn from_bbox_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let parse = |p: &str| -> Result<f64, BboxParseError> {
            p.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| BboxParseError::InvalidNumber(p.to_string()))
        };

        let bbox = Self {
            min_x: parse(parts[0])?,
            min_y: parse(parts[1])?,
            max_x: parse(parts[2])?,
            max_y: parse(parts[3])?,
        };
        bbox.validate_geographic()?;
        Ok(bbox)
    }

    /// Check that the box is a usable geographic extent.
    pub fn validate_geographic(&self) -> Result<(), BboxParseError> {
        if self.min_x >= self.max_x || self.min_y >= self.max_y {
            return Err(BboxParseError::Inverted(*self));
        }
        if self.min_y < -90.0 || self.max_y > 90.0 {
            return Err(BboxParseError::OutOfRange(format!(
                "latitudes must lie in [-90, 90], got {} to {}",
                self.min_y, self.max_y
            )));
        }
        if self.min_x < -180.0 || self.max_x > 360.0 || self.width() > 360.0 {
            return Err(BboxParseError::OutOfRange(format!(
                "longitudes must lie in [-180, 360] and span at most 360 degrees, got {} to {}",
                self.min_x, self.max_x
            )));
        }
        Ok(())
    }

    /// Width of the bounding box in degrees.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in degrees.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Format as the archive's `area` keyword: "North/West/South/East".
    pub fn to_mars_area(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            fmt_coord(self.max_y),
            fmt_coord(self.min_x),
            fmt_coord(self.min_y),
            fmt_coord(self.max_x)
        )
    }
}

/// Print whole degrees without a fractional part.
fn fmt_coord(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid bounding box format: {0}. Expected 'west,south,east,north'")]
    InvalidFormat(String),

    #[error("Invalid number in bounding box: {0}")]
    InvalidNumber(String),

    #[error("Bounding box is empty or inverted: {0:?}")]
    Inverted(BoundingBox),

    #[error("Bounding box out of range: {0}")]
    OutOfRange(String),
}

/// A map region: either a named preset or an explicit bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Region {
    Global,
    NorthAmerica,
    Europe,
    NorthAtlantic,
    Asia,
    Custom(BoundingBox),
}

impl Region {
    /// Names accepted by [`Region::parse`] for the presets.
    pub const PRESETS: &'static [&'static str] =
        &["global", "north-america", "europe", "north-atlantic", "asia"];

    /// Parse a preset name or a "west,south,east,north" box.
    pub fn parse(s: &str) -> Result<Self, BboxParseError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" | "world" => Ok(Region::Global),
            "north-america" | "na" => Ok(Region::NorthAmerica),
            "europe" | "eu" => Ok(Region::Europe),
            "north-atlantic" => Ok(Region::NorthAtlantic),
            "asia" => Ok(Region::Asia),
            _ => BoundingBox::from_bbox_string(s).map(Region::Custom),
        }
    }

    /// Geographic extent of the region.
    pub fn bbox(&self) -> BoundingBox {
        match self {
            Region::Global => BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
            Region::NorthAmerica => BoundingBox::new(-138.0, 15.0, -55.0, 62.0),
            Region::Europe => BoundingBox::new(-25.0, 30.0, 45.0, 72.0),
            Region::NorthAtlantic => BoundingBox::new(-80.0, 20.0, 10.0, 70.0),
            Region::Asia => BoundingBox::new(60.0, 5.0, 150.0, 60.0),
            Region::Custom(bbox) => *bbox,
        }
    }

    /// Short name used in logs and file metadata.
    pub fn name(&self) -> String {
        match self {
            Region::Global => "global".to_string(),
            Region::NorthAmerica => "north-america".to_string(),
            Region::Europe => "europe".to_string(),
            Region::NorthAtlantic => "north-atlantic".to_string(),
            Region::Asia => "asia".to_string(),
            Region::Custom(b) => format!("{},{},{},{}", b.min_x, b.min_y, b.max_x, b.max_y),
        }
    }
}
