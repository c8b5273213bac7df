//! Colormaps and color-field rasterisation for wind speed grids.

use jet_common::style::parse_hex_color;
use jet_common::{StyleConfig, StyleDefinition, WindGrid};
use projection::MapProjection;
use rayon::prelude::*;

use crate::error::{RenderError, RenderResult};

/// Entries in a precomputed colormap lookup table.
pub const LUT_SIZE: usize = 256;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        parse_hex_color(hex).map(|(r, g, b, a)| Self::new(r, g, b, a))
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)).round() as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)).round() as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)).round() as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)).round() as u8,
    )
}

/// Names of the built-in colormaps.
pub const BUILTIN_COLORMAPS: &[&str] = &["jetstream", "wind", "grayscale"];

/// A piecewise-linear colormap over the normalized range [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    name: String,
    stops: Vec<(f32, Color)>,
    /// Alpha rises linearly from 0 to 1 over [0, alpha_ramp].
    alpha_ramp: Option<f32>,
}

impl Colormap {
    /// White through blue, red and orange, fading in over the lowest 15%.
    pub fn jetstream() -> Self {
        Self {
            name: "jetstream".to_string(),
            stops: vec![
                (0.0, Color::new(255, 255, 255, 255)),
                (0.25, Color::new(0x34, 0x98, 0xdb, 255)),
                (0.75, Color::new(0xe7, 0x4c, 0x3c, 255)),
                (1.0, Color::new(0xf1, 0xc4, 0x0f, 255)),
            ],
            alpha_ramp: Some(0.15),
        }
    }

    /// Calm gray through cyan, yellow and orange to dark red.
    pub fn wind() -> Self {
        Self {
            name: "wind".to_string(),
            stops: vec![
                (0.0, Color::new(200, 200, 200, 255)),
                (0.25, Color::new(0, 200, 255, 255)),
                (0.5, Color::new(255, 255, 0, 255)),
                (0.75, Color::new(255, 165, 0, 255)),
                (1.0, Color::new(139, 0, 0, 255)),
            ],
            alpha_ramp: None,
        }
    }

    pub fn grayscale() -> Self {
        Self {
            name: "grayscale".to_string(),
            stops: vec![
                (0.0, Color::new(255, 255, 255, 255)),
                (1.0, Color::new(0, 0, 0, 255)),
            ],
            alpha_ramp: None,
        }
    }

    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "jetstream" => Some(Self::jetstream()),
            "wind" => Some(Self::wind()),
            "grayscale" | "greys" => Some(Self::grayscale()),
            _ => None,
        }
    }

    /// Build a colormap from a validated style definition.
    pub fn from_style(name: &str, style: &StyleDefinition) -> RenderResult<Self> {
        style
            .validate()
            .map_err(|e| RenderError::InvalidConfig(format!("style '{}': {}", name, e)))?;
        let stops = style
            .stops
            .iter()
            .map(|stop| {
                Color::from_hex(&stop.color)
                    .map(|c| (stop.value, c))
                    .ok_or_else(|| {
                        RenderError::InvalidConfig(format!("invalid color '{}'", stop.color))
                    })
            })
            .collect::<RenderResult<Vec<_>>>()?;
        Ok(Self {
            name: name.to_string(),
            stops,
            alpha_ramp: None,
        })
    }

    /// Resolve a colormap by name: built-ins first, then the style file.
    pub fn resolve(name: &str, styles: Option<&StyleConfig>) -> RenderResult<Self> {
        let key = name.trim().to_ascii_lowercase();
        if let Some(map) = Self::builtin(&key) {
            return Ok(map);
        }
        match styles.and_then(|s| s.get(name.trim())) {
            Some(style) => Self::from_style(name.trim(), style),
            None => Err(RenderError::InvalidConfig(format!(
                "unknown colormap '{}' (built-in: {})",
                name,
                BUILTIN_COLORMAPS.join(", ")
            ))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color at normalized position `t` (clamped to [0, 1]).
    pub fn color_at(&self, t: f32) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let mut color = match self.stops.iter().position(|(pos, _)| *pos >= t) {
            Some(0) => self.stops[0].1,
            Some(i) => {
                let (p0, c0) = self.stops[i - 1];
                let (p1, c1) = self.stops[i];
                let span = p1 - p0;
                if span <= f32::EPSILON {
                    c1
                } else {
                    interpolate_color(c0, c1, (t - p0) / span)
                }
            }
            None => self.stops[self.stops.len() - 1].1,
        };

        if let Some(ramp) = self.alpha_ramp {
            let factor = (t / ramp).min(1.0);
            color.a = (color.a as f32 * factor).round() as u8;
        }
        color
    }

    /// Precompute `LUT_SIZE` evenly spaced colors.
    pub fn lut(&self) -> Vec<Color> {
        (0..LUT_SIZE)
            .map(|i| self.color_at(i as f32 / (LUT_SIZE - 1) as f32))
            .collect()
    }
}

/// Map a value onto a lookup table. NaN is transparent; values outside
/// [vmin, vmax] take the end colors.
#[inline]
pub fn lut_color(lut: &[Color], value: f32, vmin: f32, vmax: f32) -> Color {
    if value.is_nan() || lut.is_empty() {
        return Color::transparent();
    }
    let t = ((value - vmin) / (vmax - vmin)).clamp(0.0, 1.0);
    lut[(t * (lut.len() - 1) as f32).round() as usize]
}

/// Rasterise a scalar field laid out like `grid` into a `width` x `height`
/// straight-alpha RGBA buffer covering the projection's bounds.
///
/// Each pixel centre is inverse-projected and the field is bilinearly
/// sampled there; pixels outside the region or over fill values stay
/// transparent. Rows are processed in parallel.
pub fn render_field(
    grid: &WindGrid,
    field: &[f32],
    proj: &MapProjection,
    width: usize,
    height: usize,
    lut: &[Color],
    vmin: f32,
    vmax: f32,
) -> Vec<u8> {
    let mut pixels = vec![0u8; width * height * 4];
    if width == 0 || height == 0 {
        return pixels;
    }
    let (x0, y0, x1, y1) = proj.bounds();
    let sx = (x1 - x0) / width as f64;
    let sy = (y1 - y0) / height as f64;

    pixels
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(row, line)| {
            let y = y1 - (row as f64 + 0.5) * sy;
            for col in 0..width {
                let x = x0 + (col as f64 + 0.5) * sx;
                let (lon, lat) = proj.inverse(x, y);
                if !proj.contains(lon, lat) {
                    continue;
                }
                let Some(value) = grid.sample_field(field, lon, lat) else {
                    continue;
                };
                let color = lut_color(lut, value, vmin, vmax);
                let i = col * 4;
                line[i] = color.r;
                line[i + 1] = color.g;
                line[i + 2] = color.b;
                line[i + 3] = color.a;
            }
        });

    pixels
}
