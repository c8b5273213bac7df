//! Wind vector overlays: arrows (quiver) and meteorological wind barbs.
//!
//! Both are drawn procedurally with tiny-skia at regularly spaced pixel
//! positions over the map. The local direction of each vector is found by
//! projecting a short step along the wind, so arrows and barbs follow the
//! meridians of conic and cylindrical projections alike.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use jet_common::WindGrid;
use projection::MapProjection;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::error::RenderError;
use crate::gradient::Color;

/// Metres per second to knots.
pub const MS_TO_KNOTS: f64 = 1.943_844;

/// Vector overlay style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayKind {
    #[default]
    None,
    Arrows,
    Barbs,
}

impl FromStr for OverlayKind {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "arrows" | "quiver" => Ok(Self::Arrows),
            "barbs" => Ok(Self::Barbs),
            other => Err(RenderError::InvalidConfig(format!(
                "unknown overlay '{}' (expected none, arrows or barbs)",
                other
            ))),
        }
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Arrows => "arrows",
            Self::Barbs => "barbs",
        })
    }
}

/// Configuration for vector overlay rendering
#[derive(Debug, Clone)]
pub struct VectorConfig {
    /// Grid spacing between vectors in pixels
    pub spacing: u32,
    pub color: Color,
    pub line_width: f32,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            spacing: 40,
            color: Color::new(0x2c, 0x3e, 0x50, 255),
            line_width: 1.2,
        }
    }
}

/// Convert U and V wind components (m/s) to speed (m/s) and direction (radians FROM)
///
/// Returns (speed_ms, direction_rad) where:
/// - speed_ms: Wind speed in meters per second
/// - direction_rad: math-convention angle of the upwind direction
///   (0 = wind from the East, π/2 = wind from the North)
pub fn uv_to_speed_direction(u: f32, v: f32) -> (f64, f64) {
    let u = u as f64;
    let v = v as f64;

    let speed = (u * u + v * v).sqrt();

    // The vector pointing back to where the wind comes from is (-u, -v).
    let mut direction = (-v).atan2(-u);

    // Normalize to [0, 2π)
    if direction < 0.0 {
        direction += 2.0 * PI;
    }

    (speed, direction)
}

/// Split a speed in knots into (pennants, full barbs, half barbs), rounded
/// to the nearest 5 knots.
pub fn barb_elements(knots: f64) -> (u32, u32, u32) {
    let rounded = ((knots / 5.0).round() * 5.0).max(0.0) as u32;
    let pennants = rounded / 50;
    let full = (rounded % 50) / 10;
    let half = (rounded % 10) / 5;
    (pennants, full, half)
}

/// Calculate positions for vectors on a grid with decimation
pub fn calculate_barb_positions(width: usize, height: usize, spacing: u32) -> Vec<(usize, usize)> {
    let mut positions = Vec::new();
    let spacing = spacing.max(1) as usize;

    // Start from spacing/2 to center the grid
    let offset = spacing / 2;

    let mut y = offset;
    while y < height {
        let mut x = offset;
        while x < width {
            positions.push((x, y));
            x += spacing;
        }
        y += spacing;
    }

    positions
}

/// A wind sample placed on the map, with its screen-space unit direction.
#[derive(Debug, Clone, Copy)]
struct PlacedVector {
    x: f32,
    y: f32,
    speed_ms: f64,
    /// Unit vector along the flow, in screen coordinates (y down).
    dx: f32,
    dy: f32,
}

/// Sample the grid at every overlay position inside the map box.
fn place_vectors(
    grid: &WindGrid,
    proj: &MapProjection,
    map_x: f32,
    map_y: f32,
    map_width: usize,
    map_height: usize,
    spacing: u32,
) -> Vec<PlacedVector> {
    let (x0, y0, x1, y1) = proj.bounds();
    let sx = (x1 - x0) / map_width as f64;
    let sy = (y1 - y0) / map_height as f64;

    calculate_barb_positions(map_width, map_height, spacing)
        .into_iter()
        .filter_map(|(px, py)| {
            let x = x0 + (px as f64 + 0.5) * sx;
            let y = y1 - (py as f64 + 0.5) * sy;
            let (lon, lat) = proj.inverse(x, y);
            if !proj.contains(lon, lat) {
                return None;
            }
            let (u, v) = grid.sample(lon, lat)?;
            let (speed_ms, _) = uv_to_speed_direction(u, v);

            // Step a fraction of a degree along the wind and project it.
            let step = 0.1 / speed_ms.max(1e-6);
            let coslat = lat.to_radians().cos().max(0.05);
            let lon2 = lon + step * u as f64 / coslat;
            let lat2 = (lat + step * v as f64).clamp(-89.9, 89.9);
            let (ax, ay) = proj.forward(lon, lat);
            let (bx, by) = proj.forward(lon2, lat2);
            let (ddx, ddy) = ((bx - ax) / sx, -(by - ay) / sy);
            let norm = (ddx * ddx + ddy * ddy).sqrt();
            let (dx, dy) = if norm > 0.0 && speed_ms > 0.0 {
                ((ddx / norm) as f32, (ddy / norm) as f32)
            } else {
                (0.0, 0.0)
            };

            Some(PlacedVector {
                x: map_x + px as f32 + 0.5,
                y: map_y + py as f32 + 0.5,
                speed_ms,
                dx,
                dy,
            })
        })
        .collect()
}

/// Draw the overlay onto `pixmap` over the map box at (`map_x`, `map_y`).
///
/// Returns the number of vectors drawn.
#[allow(clippy::too_many_arguments)]
pub fn draw_vectors(
    pixmap: &mut Pixmap,
    grid: &WindGrid,
    proj: &MapProjection,
    map_x: f32,
    map_y: f32,
    map_width: usize,
    map_height: usize,
    kind: OverlayKind,
    config: &VectorConfig,
) -> usize {
    if kind == OverlayKind::None || map_width == 0 || map_height == 0 {
        return 0;
    }
    let vectors = place_vectors(
        grid,
        proj,
        map_x,
        map_y,
        map_width,
        map_height,
        config.spacing,
    );

    let mut paint = Paint::default();
    paint.set_color(config.color.to_skia());
    paint.anti_alias = true;

    let mut stroke = Stroke::default();
    stroke.width = config.line_width;
    stroke.line_cap = LineCap::Round;
    stroke.line_join = LineJoin::Round;

    let length = config.spacing as f32 * 0.8;
    match kind {
        OverlayKind::Arrows => {
            let max_speed = vectors.iter().map(|v| v.speed_ms).fold(0.0, f64::max);
            for v in &vectors {
                let scale = if max_speed > 0.0 {
                    (v.speed_ms / max_speed) as f32
                } else {
                    0.0
                };
                draw_arrow(pixmap, v, length * scale, &paint, &stroke);
            }
        }
        OverlayKind::Barbs => {
            for v in &vectors {
                draw_barb(pixmap, v, length, &paint, &stroke);
            }
        }
        OverlayKind::None => {}
    }

    tracing::debug!(kind = %kind, count = vectors.len(), "Drew vector overlay");
    vectors.len()
}

/// Arrow centred on the sample point, pointing downwind.
fn draw_arrow(pixmap: &mut Pixmap, v: &PlacedVector, length: f32, paint: &Paint, stroke: &Stroke) {
    if length < 1.0 {
        return;
    }
    let half = length / 2.0;
    let (tail_x, tail_y) = (v.x - v.dx * half, v.y - v.dy * half);
    let (tip_x, tip_y) = (v.x + v.dx * half, v.y + v.dy * half);

    let mut pb = PathBuilder::new();
    pb.move_to(tail_x, tail_y);
    pb.line_to(tip_x, tip_y);
    if let Some(path) = pb.finish() {
        pixmap.stroke_path(&path, paint, stroke, Transform::identity(), None);
    }

    // Head: a filled triangle with sides at ±25° from the shaft.
    let head = (length * 0.3).clamp(3.0, 8.0);
    let (px, py) = (-v.dy, v.dx);
    let base_x = tip_x - v.dx * head;
    let base_y = tip_y - v.dy * head;
    let spread = head * 0.45;

    let mut pb = PathBuilder::new();
    pb.move_to(tip_x, tip_y);
    pb.line_to(base_x + px * spread, base_y + py * spread);
    pb.line_to(base_x - px * spread, base_y - py * spread);
    pb.close();
    if let Some(path) = pb.finish() {
        pixmap.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
    }
}

/// Barb with its staff pointing upwind from the sample point.
fn draw_barb(pixmap: &mut Pixmap, v: &PlacedVector, length: f32, paint: &Paint, stroke: &Stroke) {
    let knots = v.speed_ms * MS_TO_KNOTS;
    let (pennants, full, half) = barb_elements(knots);

    if pennants + full + half == 0 {
        // Calm: an empty circle.
        let mut pb = PathBuilder::new();
        pb.push_circle(v.x, v.y, (length * 0.08).max(1.5));
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, paint, stroke, Transform::identity(), None);
        }
        return;
    }

    // Staff direction (upwind) and the feather side.
    let (sx, sy) = (-v.dx, -v.dy);
    let (px, py) = (-sy, sx);
    let (tip_x, tip_y) = (v.x + sx * length, v.y + sy * length);
    let feather = length * 0.4;
    let gap = length * 0.14;

    let mut pb = PathBuilder::new();
    pb.move_to(v.x, v.y);
    pb.line_to(tip_x, tip_y);
    if let Some(path) = pb.finish() {
        pixmap.stroke_path(&path, paint, stroke, Transform::identity(), None);
    }

    // Elements are laid out from the tip towards the station.
    let mut offset = 0.0f32;
    for _ in 0..pennants {
        let (ax, ay) = (tip_x - sx * offset, tip_y - sy * offset);
        let (bx, by) = (ax - sx * gap, ay - sy * gap);
        let mut pb = PathBuilder::new();
        pb.move_to(ax, ay);
        pb.line_to(ax + px * feather, ay + py * feather);
        pb.line_to(bx, by);
        pb.close();
        if let Some(path) = pb.finish() {
            pixmap.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
        }
        offset += gap * 1.2;
    }
    let mut feathers = vec![1.0f32; full as usize];
    if half > 0 {
        // A lone half barb sits one step in from the tip.
        if pennants + full == 0 {
            offset += gap;
        }
        feathers.push(0.5);
    }
    for scale in feathers {
        let (ax, ay) = (tip_x - sx * offset, tip_y - sy * offset);
        let len = feather * scale;
        let mut pb = PathBuilder::new();
        pb.move_to(ax, ay);
        pb.line_to(ax + px * len + sx * len * 0.25, ay + py * len + sy * len * 0.25);
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, paint, stroke, Transform::identity(), None);
        }
        offset += gap;
    }
}
