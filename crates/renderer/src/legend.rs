//! Colorbar and text drawing.
//!
//! Tick labels are drawn as stroked seven-segment digits so the colorbar
//! needs no font. Titles and labels go through a TrueType font when one is
//! configured.

use std::path::Path;

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::error::{RenderError, RenderResult};
use crate::gradient::{lut_color, Color};

/// Pixel rectangle of the colorbar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorbarRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Draw a horizontal colorbar with tick marks and numeric labels below it.
///
/// Returns the ticks that were drawn; ticks outside [vmin, vmax] are skipped.
pub fn draw_colorbar(
    pixmap: &mut Pixmap,
    rect: ColorbarRect,
    lut: &[Color],
    vmin: f32,
    vmax: f32,
    ticks: &[f32],
    ink: Color,
) -> Vec<f32> {
    let columns = rect.width.round().max(1.0) as usize;
    for col in 0..columns {
        let t = (col as f32 + 0.5) / columns as f32;
        let color = lut_color(lut, vmin + t * (vmax - vmin), vmin, vmax);
        if let Some(cell) = Rect::from_xywh(rect.x + col as f32, rect.y, 1.0, rect.height) {
            let mut paint = Paint::default();
            paint.set_color(color.to_skia());
            pixmap.fill_rect(cell, &paint, Transform::identity(), None);
        }
    }

    let mut paint = Paint::default();
    paint.set_color(ink.to_skia());
    paint.anti_alias = true;

    let mut stroke = Stroke::default();
    stroke.width = 1.0;
    stroke.line_join = LineJoin::Miter;

    if let Some(outline) = Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) {
        let path = PathBuilder::from_rect(outline);
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    let digit_height = (rect.height * 0.55).clamp(6.0, 14.0);
    let mut drawn = Vec::new();
    for &tick in ticks {
        if !(vmin..=vmax).contains(&tick) {
            tracing::warn!(tick, vmin, vmax, "Colorbar tick outside value range, skipped");
            continue;
        }
        let x = rect.x + (tick - vmin) / (vmax - vmin) * rect.width;
        let bottom = rect.y + rect.height;

        let mut pb = PathBuilder::new();
        pb.move_to(x, bottom);
        pb.line_to(x, bottom + 4.0);
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }

        draw_number(
            pixmap,
            &format_tick(tick),
            x,
            bottom + 6.0 + digit_height / 2.0,
            digit_height,
            &paint,
        );
        drawn.push(tick);
    }
    drawn
}

/// Integers print without decimals, anything else with one.
pub fn format_tick(value: f32) -> String {
    if value.fract().abs() < 1e-6 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// Draw `text` centred on (`cx`, `cy`) with stroked seven-segment glyphs.
pub fn draw_number(pixmap: &mut Pixmap, text: &str, cx: f32, cy: f32, height: f32, paint: &Paint) {
    let char_width = height * 0.55;
    let advance = char_width * 1.5;
    let count = text.chars().count() as f32;
    let start = cx - (count - 1.0) * advance / 2.0;

    for (i, ch) in text.chars().enumerate() {
        draw_character(pixmap, start + i as f32 * advance, cy, ch, char_width, height, paint);
    }
}

/// Segments of a digit glyph in a box of half-size (`hw`, `hh`), y down.
fn glyph_segments(ch: char, hw: f32, hh: f32) -> Vec<((f32, f32), (f32, f32))> {
    let top = ((-hw, -hh), (hw, -hh));
    let middle = ((-hw, 0.0), (hw, 0.0));
    let bottom = ((-hw, hh), (hw, hh));
    let upper_left = ((-hw, -hh), (-hw, 0.0));
    let upper_right = ((hw, -hh), (hw, 0.0));
    let lower_left = ((-hw, 0.0), (-hw, hh));
    let lower_right = ((hw, 0.0), (hw, hh));

    match ch {
        '0' => vec![top, bottom, upper_left, lower_left, upper_right, lower_right],
        '1' => vec![((0.0, -hh), (0.0, hh))],
        '2' => vec![top, upper_right, middle, lower_left, bottom],
        '3' => vec![top, upper_right, middle, lower_right, bottom],
        '4' => vec![upper_left, middle, upper_right, lower_right],
        '5' => vec![top, upper_left, middle, lower_right, bottom],
        '6' => vec![top, upper_left, lower_left, bottom, lower_right, middle],
        '7' => vec![top, ((hw, -hh), (0.0, hh))],
        '8' => vec![top, middle, bottom, upper_left, lower_left, upper_right, lower_right],
        '9' => vec![top, upper_left, upper_right, middle, lower_right, bottom],
        '-' => vec![((-hw * 0.6, 0.0), (hw * 0.6, 0.0))],
        '.' => vec![((0.0, hh * 0.85), (0.0, hh))],
        _ => Vec::new(),
    }
}

fn draw_character(
    pixmap: &mut Pixmap,
    x: f32,
    y: f32,
    ch: char,
    width: f32,
    height: f32,
    paint: &Paint,
) {
    let segments = glyph_segments(ch, width / 2.0, height / 2.0);
    if segments.is_empty() {
        return;
    }

    let mut stroke = Stroke::default();
    stroke.width = (width * 0.2).max(1.0);
    stroke.line_cap = LineCap::Round;
    stroke.line_join = LineJoin::Round;

    let mut pb = PathBuilder::new();
    for ((x1, y1), (x2, y2)) in segments {
        pb.move_to(x + x1, y + y1);
        pb.line_to(x + x2, y + y2);
    }
    if let Some(path) = pb.finish() {
        pixmap.stroke_path(&path, paint, &stroke, Transform::identity(), None);
    }
}

/// TrueType text drawn onto the composed image.
pub struct TextRenderer {
    font: Font<'static>,
}

impl TextRenderer {
    pub fn from_file(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let font_err = |message: String| RenderError::Font {
            path: path.display().to_string(),
            message,
        };
        let data = std::fs::read(path).map_err(|e| font_err(e.to_string()))?;
        let font = Font::try_from_vec(data)
            .ok_or_else(|| font_err("not a TrueType font".to_string()))?;
        Ok(Self { font })
    }

    /// Width and height of `text` in pixels at `size`.
    pub fn measure(&self, text: &str, size: f32) -> (i32, i32) {
        text_size(Scale::uniform(size), &self.font, text)
    }

    /// Draw `text` with its top-left corner at (`x`, `y`).
    pub fn draw(&self, image: &mut RgbaImage, text: &str, x: i32, y: i32, size: f32, color: Color) {
        draw_text_mut(
            image,
            Rgba([color.r, color.g, color.b, color.a]),
            x,
            y,
            Scale::uniform(size),
            &self.font,
            text,
        );
    }

    /// Draw `text` horizontally centred on `cx`.
    pub fn draw_centered(
        &self,
        image: &mut RgbaImage,
        text: &str,
        cx: i32,
        y: i32,
        size: f32,
        color: Color,
    ) {
        let (width, _) = self.measure(text, size);
        self.draw(image, text, cx - width / 2, y, size, color);
    }
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::Colormap;

    fn ink_pixels(pixmap: &Pixmap) -> usize {
        pixmap.data().chunks_exact(4).filter(|p| p[3] > 0).count()
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(150.0), "150");
        assert_eq!(format_tick(-2.5), "-2.5");
    }

    #[test]
    fn test_colorbar_skips_out_of_range_ticks() {
        let mut pixmap = Pixmap::new(400, 60).unwrap();
        let rect = ColorbarRect {
            x: 10.0,
            y: 5.0,
            width: 380.0,
            height: 15.0,
        };
        let lut = Colormap::wind().lut();
        let drawn = draw_colorbar(
            &mut pixmap,
            rect,
            &lut,
            30.0,
            220.0,
            &[100.0, 150.0, 200.0, 250.0],
            Color::new(0, 0, 0, 255),
        );
        assert_eq!(drawn, vec![100.0, 150.0, 200.0]);
    }

    #[test]
    fn test_colorbar_gradient_ends() {
        let mut pixmap = Pixmap::new(200, 40).unwrap();
        let rect = ColorbarRect {
            x: 0.0,
            y: 0.0,
            width: 200.0,
            height: 20.0,
        };
        let lut = Colormap::grayscale().lut();
        draw_colorbar(&mut pixmap, rect, &lut, 0.0, 1.0, &[], Color::new(255, 0, 0, 255));

        let px = |x: u32, y: u32| pixmap.pixel(x, y).unwrap();
        // Left end is near white, right end near black.
        assert!(px(3, 10).red() > 240);
        assert!(px(196, 10).red() < 15);
    }

    #[test]
    fn test_digits_draw_ink() {
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);

        for text in ["0", "1", "250", "-7.5"] {
            let mut pixmap = Pixmap::new(80, 30).unwrap();
            draw_number(&mut pixmap, text, 40.0, 15.0, 12.0, &paint);
            assert!(ink_pixels(&pixmap) > 0, "no ink for {}", text);
        }

        let mut pixmap = Pixmap::new(80, 30).unwrap();
        draw_number(&mut pixmap, "x", 40.0, 15.0, 12.0, &paint);
        assert_eq!(ink_pixels(&pixmap), 0);
    }

    #[test]
    fn test_missing_font_is_font_error() {
        let err = TextRenderer::from_file("/nonexistent/font.ttf").unwrap_err();
        assert!(matches!(err, RenderError::Font { .. }));
    }

    #[test]
    fn test_invalid_font_is_font_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        let err = TextRenderer::from_file(&path).unwrap_err();
        assert!(matches!(err, RenderError::Font { .. }));
    }
}
