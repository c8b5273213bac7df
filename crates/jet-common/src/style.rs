//! JSON style files describing custom color ramps.
//!
//! A style file holds named gradient definitions:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "styles": {
//!     "jet-dark": {
//!       "name": "Dark jet",
//!       "stops": [
//!         {"value": 0.0, "color": "#00000000"},
//!         {"value": 0.5, "color": "#3498db"},
//!         {"value": 1.0, "color": "#f1c40f"}
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! Stop values are positions in the normalized [0, 1] range between the
//! render's vmin and vmax.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Root style configuration - can contain multiple named styles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Version of the style schema
    #[serde(default = "default_version")]
    pub version: String,

    /// Named style definitions
    pub styles: HashMap<String, StyleDefinition>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl StyleConfig {
    /// Load style configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StyleError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StyleError::IoError(e.to_string()))?;
        Self::from_json(&content)
    }

    /// Parse style configuration from JSON string.
    pub fn from_json(json: &str) -> Result<Self, StyleError> {
        let config: StyleConfig =
            serde_json::from_str(json).map_err(|e| StyleError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Get a style by name.
    pub fn get(&self, name: &str) -> Option<&StyleDefinition> {
        self.styles.get(name)
    }

    /// Validate all styles in the configuration.
    pub fn validate(&self) -> Result<(), StyleError> {
        for (name, style) in &self.styles {
            style
                .validate()
                .map_err(|e| StyleError::ValidationError(format!("{}: {}", name, e)))?;
        }
        Ok(())
    }
}

/// A gradient definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleDefinition {
    /// Human-readable name
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Color stops, sorted by position
    pub stops: Vec<ColorStop>,

    /// Unit label for the colorbar
    #[serde(default)]
    pub units: Option<String>,
}

impl StyleDefinition {
    pub fn validate(&self) -> Result<(), String> {
        if self.stops.len() < 2 {
            return Err("a gradient needs at least two stops".to_string());
        }
        for stop in &self.stops {
            if !(0.0..=1.0).contains(&stop.value) {
                return Err(format!("stop position {} is outside [0, 1]", stop.value));
            }
            if parse_hex_color(&stop.color).is_none() {
                return Err(format!("invalid color '{}'", stop.color));
            }
        }
        if self.stops.windows(2).any(|w| w[1].value < w[0].value) {
            return Err("stop positions must be ascending".to_string());
        }
        Ok(())
    }
}

/// A color at a normalized position of the gradient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorStop {
    pub value: f32,
    /// `#RRGGBB` or `#RRGGBBAA`
    pub color: String,
}

/// Parse `#RRGGBB` or `#RRGGBBAA` into RGBA.
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8, u8)> {
    let hex = hex.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        6 => Some((channel(0)?, channel(2)?, channel(4)?, 255)),
        8 => Some((channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("Failed to read style file: {0}")]
    IoError(String),

    #[error("Failed to parse style JSON: {0}")]
    ParseError(String),

    #[error("Invalid style: {0}")]
    ValidationError(String),
}
