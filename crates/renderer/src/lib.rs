//! Wind map rendering.
//!
//! Turns a [`WindGrid`](jet_common::WindGrid) and its speed field into a
//! finished map image:
//! - Colormaps and field rasterisation ([`gradient`])
//! - Wind arrows and barbs ([`vectors`])
//! - Colorbar, tick digits and TrueType text ([`legend`])
//! - Layout and composition ([`map`])
//! - PNG encoding ([`png`]); WebP goes through the `webp` crate

pub mod error;
pub mod gradient;
pub mod legend;
pub mod map;
pub mod png;
pub mod vectors;

pub use error::{RenderError, RenderResult};
pub use gradient::{Color, Colormap};
pub use map::{ImageFormat, MapImage, MapLayout, MapRenderer, RenderConfig};
pub use vectors::{OverlayKind, VectorConfig};
