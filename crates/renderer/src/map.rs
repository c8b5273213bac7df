//! Map composition: field, graticule, overlay, colorbar and text.
//!
//! A render produces one image laid out like a 6.4 x 4.8 inch figure at the
//! configured dpi. The wind speed field is rasterised into a map box of
//! fixed aspect, vectors and grid lines are drawn on top, the colorbar goes
//! below the map and the title above it.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use image::RgbaImage;
use jet_common::{BoundingBox, WindGrid};
use projection::{MapProjection, ProjectionKind};
use tiny_skia::{
    IntSize, LineCap, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

use crate::error::{RenderError, RenderResult};
use crate::gradient::{render_field, Color, Colormap};
use crate::legend::{draw_colorbar, ColorbarRect, TextRenderer};
use crate::png::create_png_auto;
use crate::vectors::{draw_vectors, OverlayKind, VectorConfig};

/// Figure size in inches.
pub const FIGURE_INCHES: (f32, f32) = (6.4, 4.8);

/// Map box in figure fractions: left, top, right, bottom.
const MAP_BOX: (f32, f32, f32, f32) = (0.05, 0.12, 0.95, 0.88);

/// Output image encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Webp,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    /// Encode a composed image. PNG output carries `tEXt` metadata.
    pub fn encode(&self, image: &RgbaImage, text: &[(&str, &str)]) -> RenderResult<Vec<u8>> {
        let (width, height) = image.dimensions();
        match self {
            Self::Png => create_png_auto(image.as_raw(), width as usize, height as usize, text),
            Self::Webp => {
                let encoder = webp::Encoder::from_rgba(image.as_raw(), width, height);
                Ok(encoder.encode_lossless().to_vec())
            }
        }
    }
}

impl FromStr for ImageFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            other => Err(RenderError::InvalidConfig(format!(
                "unsupported image format '{}' (expected png or webp)",
                other
            ))),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Plotting configuration for one render.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub dpi: u32,
    pub projection: ProjectionKind,
    pub colormap: Colormap,
    pub overlay: OverlayKind,
    pub vectors: VectorConfig,
    pub vmin: f32,
    pub vmax: f32,
    /// Degrees between graticule lines; 0 disables them.
    pub graticule_spacing: f64,
    pub graticule_color: Color,
    pub background: Color,
    pub ink: Color,
    pub font: Option<PathBuf>,
    pub title: Option<String>,
    pub colorbar_label: Option<String>,
    pub ticks: Vec<f32>,
    pub format: ImageFormat,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            projection: ProjectionKind::Cyl,
            colormap: Colormap::jetstream(),
            overlay: OverlayKind::None,
            vectors: VectorConfig::default(),
            vmin: 30.0,
            vmax: 220.0,
            graticule_spacing: 30.0,
            graticule_color: Color::new(0x7f, 0x8c, 0x8d, 255),
            background: Color::new(255, 255, 255, 255),
            ink: Color::new(0x2c, 0x3e, 0x50, 255),
            font: None,
            title: None,
            colorbar_label: None,
            ticks: vec![100.0, 150.0, 200.0, 250.0],
            format: ImageFormat::Png,
        }
    }
}

impl RenderConfig {
    /// Output size in pixels for the configured dpi.
    pub fn image_size(&self) -> (u32, u32) {
        (
            (FIGURE_INCHES.0 * self.dpi as f32).round() as u32,
            (FIGURE_INCHES.1 * self.dpi as f32).round() as u32,
        )
    }

    pub fn validate(&self) -> RenderResult<()> {
        if !(self.vmin.is_finite() && self.vmax.is_finite()) || self.vmin >= self.vmax {
            return Err(RenderError::InvalidConfig(format!(
                "value range must satisfy vmin < vmax, got {} and {}",
                self.vmin, self.vmax
            )));
        }
        let (width, height) = self.image_size();
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "image size is zero at {} dpi",
                self.dpi
            )));
        }
        if self.overlay != OverlayKind::None && self.vectors.spacing == 0 {
            return Err(RenderError::InvalidConfig(
                "overlay spacing must be positive".to_string(),
            ));
        }
        if !self.graticule_spacing.is_finite() || self.graticule_spacing < 0.0 {
            return Err(RenderError::InvalidConfig(format!(
                "graticule spacing must be non-negative, got {}",
                self.graticule_spacing
            )));
        }
        Ok(())
    }
}

/// Pixel placement of the map and the colorbar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapLayout {
    pub width: u32,
    pub height: u32,
    pub map_x: u32,
    pub map_y: u32,
    pub map_width: u32,
    pub map_height: u32,
    pub colorbar: ColorbarRect,
}

impl MapLayout {
    /// Fit a map of the given aspect ratio (width / height) inside the map
    /// box, centred.
    pub fn compute(width: u32, height: u32, aspect: f64) -> Self {
        let (w, h) = (width as f32, height as f32);
        let box_x = MAP_BOX.0 * w;
        let box_y = MAP_BOX.1 * h;
        let box_w = (MAP_BOX.2 - MAP_BOX.0) * w;
        let box_h = (MAP_BOX.3 - MAP_BOX.1) * h;

        let aspect = aspect as f32;
        let (map_w, map_h) = if aspect >= box_w / box_h {
            (box_w, box_w / aspect)
        } else {
            (box_h * aspect, box_h)
        };
        let map_w = map_w.round().max(1.0);
        let map_h = map_h.round().max(1.0);
        let map_x = (box_x + (box_w - map_w) / 2.0).round();
        let map_y = (box_y + (box_h - map_h) / 2.0).round();

        let colorbar = ColorbarRect {
            x: map_x,
            y: map_y + map_h + 0.02 * h,
            width: map_w,
            height: (0.025 * h).max(2.0),
        };

        Self {
            width,
            height,
            map_x: map_x as u32,
            map_y: map_y as u32,
            map_width: map_w as u32,
            map_height: map_h as u32,
            colorbar,
        }
    }
}

/// The rendered output artifact.
#[derive(Debug, Clone)]
pub struct MapImage {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

/// Draws wind maps with a fixed configuration.
#[derive(Debug)]
pub struct MapRenderer {
    config: RenderConfig,
    lut: Vec<Color>,
    text: Option<TextRenderer>,
}

impl MapRenderer {
    /// Validate the configuration and load the font, if any.
    pub fn new(config: RenderConfig) -> RenderResult<Self> {
        config.validate()?;
        let text = config.font.as_ref().map(TextRenderer::from_file).transpose()?;
        let lut = config.colormap.lut();
        Ok(Self { config, lut, text })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Compose the map of `speeds` (laid out like `grid`) over `region`.
    pub fn compose(
        &self,
        grid: &WindGrid,
        speeds: &[f32],
        region: &BoundingBox,
    ) -> RenderResult<RgbaImage> {
        let cfg = &self.config;
        if speeds.len() != grid.u().len() {
            return Err(RenderError::InvalidConfig(format!(
                "speed field has {} values for a {}x{} grid",
                speeds.len(),
                grid.width(),
                grid.height()
            )));
        }
        if !region_has_data(grid, region) {
            return Err(RenderError::InvalidConfig(format!(
                "region {:?} does not overlap the data extent {:?}",
                region,
                grid.extent()
            )));
        }

        let proj = MapProjection::for_region(cfg.projection, region)?;
        let (width, height) = cfg.image_size();
        let layout = MapLayout::compute(width, height, proj.aspect_ratio());
        tracing::debug!(
            width,
            height,
            map_width = layout.map_width,
            map_height = layout.map_height,
            projection = %cfg.projection,
            "Computed map layout"
        );

        let mut canvas = pixmap(width, height)?;
        canvas.fill(cfg.background.to_skia());

        let map = self.draw_map(grid, speeds, &proj, &layout)?;
        canvas.draw_pixmap(
            layout.map_x as i32,
            layout.map_y as i32,
            map.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        stroke_frame(&mut canvas, &layout, cfg.ink);

        draw_colorbar(
            &mut canvas,
            layout.colorbar,
            &self.lut,
            cfg.vmin,
            cfg.vmax,
            &cfg.ticks,
            cfg.ink,
        );

        let mut image = to_image(&canvas)?;
        if let Some(text) = &self.text {
            self.draw_text(text, &mut image, &layout);
        }
        Ok(image)
    }

    /// Compose and encode in the configured format.
    pub fn render(
        &self,
        grid: &WindGrid,
        speeds: &[f32],
        region: &BoundingBox,
    ) -> RenderResult<MapImage> {
        let image = self.compose(grid, speeds, region)?;
        let title = self.config.title.as_deref().unwrap_or("Wind map");
        let metadata = [("Title", title), ("Software", "jetstream")];
        let bytes = self.config.format.encode(&image, &metadata)?;
        tracing::info!(
            width = image.width(),
            height = image.height(),
            format = %self.config.format,
            bytes = bytes.len(),
            "Rendered map"
        );
        Ok(MapImage {
            width: image.width(),
            height: image.height(),
            format: self.config.format,
            bytes,
        })
    }

    /// Field, graticule and overlay, clipped to the map box.
    fn draw_map(
        &self,
        grid: &WindGrid,
        speeds: &[f32],
        proj: &MapProjection,
        layout: &MapLayout,
    ) -> RenderResult<Pixmap> {
        let cfg = &self.config;
        let (w, h) = (layout.map_width as usize, layout.map_height as usize);

        let mut pixels = render_field(grid, speeds, proj, w, h, &self.lut, cfg.vmin, cfg.vmax);
        premultiply(&mut pixels);
        let size = IntSize::from_wh(layout.map_width, layout.map_height)
            .ok_or_else(|| RenderError::InvalidConfig("map box is empty".to_string()))?;
        let mut map = Pixmap::from_vec(pixels, size)
            .ok_or_else(|| RenderError::InvalidConfig("map buffer size mismatch".to_string()))?;

        if cfg.graticule_spacing > 0.0 {
            draw_graticule(&mut map, proj, cfg.graticule_spacing, cfg.graticule_color);
        }
        draw_vectors(&mut map, grid, proj, 0.0, 0.0, w, h, cfg.overlay, &cfg.vectors);
        Ok(map)
    }

    fn draw_text(&self, text: &TextRenderer, image: &mut RgbaImage, layout: &MapLayout) {
        let cfg = &self.config;
        let h = layout.height as f32;
        if let Some(title) = &cfg.title {
            text.draw(
                image,
                title,
                (0.05 * layout.width as f32) as i32,
                (0.02 * h) as i32,
                0.06 * h,
                cfg.ink,
            );
        }
        if let Some(label) = &cfg.colorbar_label {
            let bar = layout.colorbar;
            let cx = (bar.x + bar.width / 2.0) as i32;
            let y = bar.y + bar.height + 6.0 + (bar.height * 0.55).clamp(6.0, 14.0) + 4.0;
            text.draw_centered(image, label, cx, y as i32, 0.022 * h, cfg.ink);
        }
    }
}

/// Whether any point of a lattice over `region` falls on valid data.
pub fn region_has_data(grid: &WindGrid, region: &BoundingBox) -> bool {
    const STEPS: usize = 32;
    (0..=STEPS).any(|j| {
        let lat = region.min_y + region.height() * j as f64 / STEPS as f64;
        (0..=STEPS).any(|i| {
            let lon = region.min_x + region.width() * i as f64 / STEPS as f64;
            grid.sample(lon, lat).is_some()
        })
    })
}

fn pixmap(width: u32, height: u32) -> RenderResult<Pixmap> {
    Pixmap::new(width, height)
        .ok_or_else(|| RenderError::InvalidConfig(format!("invalid image size {}x{}", width, height)))
}

/// Straight to premultiplied alpha, in place.
fn premultiply(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
}

/// Demultiply a pixmap into an RGBA image.
fn to_image(pixmap: &Pixmap) -> RenderResult<RgbaImage> {
    let mut raw = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        raw.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), raw)
        .ok_or_else(|| RenderError::Encode("canvas buffer size mismatch".to_string()))
}

fn stroke_frame(canvas: &mut Pixmap, layout: &MapLayout, ink: Color) {
    let Some(rect) = Rect::from_xywh(
        layout.map_x as f32,
        layout.map_y as f32,
        layout.map_width as f32,
        layout.map_height as f32,
    ) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(ink.to_skia());
    paint.anti_alias = true;
    let mut stroke = Stroke::default();
    stroke.width = 1.0;
    canvas.stroke_path(&PathBuilder::from_rect(rect), &paint, &stroke, Transform::identity(), None);
}

/// Meridians and parallels every `spacing` degrees inside the region.
fn draw_graticule(map: &mut Pixmap, proj: &MapProjection, spacing: f64, color: Color) {
    const SEGMENTS: usize = 90;
    let region = *proj.region();
    let (x0, y0, x1, y1) = proj.bounds();
    let sx = map.width() as f64 / (x1 - x0);
    let sy = map.height() as f64 / (y1 - y0);
    let to_px = |lon: f64, lat: f64| {
        let (x, y) = proj.forward(lon, lat);
        (((x - x0) * sx) as f32, ((y1 - y) * sy) as f32)
    };

    let mut pb = PathBuilder::new();
    let mut polyline = |points: Vec<(f64, f64)>| {
        for (i, (lon, lat)) in points.into_iter().enumerate() {
            let (x, y) = to_px(lon, lat);
            if i == 0 {
                pb.move_to(x, y);
            } else {
                pb.line_to(x, y);
            }
        }
    };

    let mut lon = (region.min_x / spacing).ceil() * spacing;
    while lon <= region.max_x + 1e-9 {
        polyline(
            (0..=SEGMENTS)
                .map(|k| (lon, region.min_y + region.height() * k as f64 / SEGMENTS as f64))
                .collect(),
        );
        lon += spacing;
    }
    let mut lat = (region.min_y / spacing).ceil() * spacing;
    while lat <= region.max_y + 1e-9 {
        polyline(
            (0..=SEGMENTS)
                .map(|k| (region.min_x + region.width() * k as f64 / SEGMENTS as f64, lat))
                .collect(),
        );
        lat += spacing;
    }

    let Some(path) = pb.finish() else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    let mut stroke = Stroke::default();
    stroke.width = 0.6;
    stroke.line_cap = LineCap::Butt;
    map.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}
