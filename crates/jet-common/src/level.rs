//! Pressure levels served by the reanalysis archive.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pressure levels (hPa) available on the archive's pressure-level grid.
pub const SUPPORTED_LEVELS: &[u16] = &[
    1, 2, 3, 5, 7, 10, 20, 30, 50, 70, 100, 125, 150, 175, 200, 225, 250, 300, 350, 400, 450,
    500, 550, 600, 650, 700, 750, 775, 800, 825, 850, 875, 900, 925, 950, 975, 1000,
];

/// An atmospheric pressure level in hectopascals (millibars).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct PressureLevel(u16);

impl PressureLevel {
    /// The jet stream level.
    pub const JETSTREAM: PressureLevel = PressureLevel(250);

    /// Create a level, rejecting values the archive does not serve.
    pub fn new(hpa: u16) -> Result<Self, LevelError> {
        if SUPPORTED_LEVELS.contains(&hpa) {
            Ok(Self(hpa))
        } else {
            Err(LevelError::Unsupported(hpa))
        }
    }

    /// Parse "250", "250hPa", "250 mb" or "250mbar".
    pub fn parse(s: &str) -> Result<Self, LevelError> {
        let lower = s.trim().to_ascii_lowercase();
        let digits = ["hpa", "mbar", "mb"]
            .iter()
            .find_map(|suffix| lower.strip_suffix(suffix))
            .unwrap_or(&lower)
            .trim();
        let hpa: u16 = digits
            .parse()
            .map_err(|_| LevelError::InvalidFormat(s.to_string()))?;
        Self::new(hpa)
    }

    pub fn hpa(&self) -> u16 {
        self.0
    }

    pub fn is_jetstream(&self) -> bool {
        *self == Self::JETSTREAM
    }

    /// Multiplier applied to raw wind speeds (m/s) before coloring.
    ///
    /// Upper-level winds are much stronger, so the jet stream level uses a
    /// smaller factor to land in the same color range as lower levels.
    pub fn default_speed_factor(&self) -> f32 {
        if self.is_jetstream() {
            3.0
        } else {
            7.5
        }
    }
}

impl fmt::Display for PressureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hPa", self.0)
    }
}

impl TryFrom<u16> for PressureLevel {
    type Error = LevelError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PressureLevel> for u16 {
    fn from(level: PressureLevel) -> Self {
        level.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("{0} hPa is not a supported pressure level")]
    Unsupported(u16),

    #[error("Invalid pressure level: '{0}'")]
    InvalidFormat(String),
}
