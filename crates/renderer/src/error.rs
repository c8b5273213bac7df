//! Error types for map rendering.

use jet_common::JetError;
use projection::ProjectionError;
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    /// Plotting configuration that cannot be drawn
    #[error("Invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error("Failed to load font {path}: {message}")]
    Font { path: String, message: String },

    #[error("Image encoding failed: {0}")]
    Encode(String),
}

impl From<RenderError> for JetError {
    fn from(err: RenderError) -> Self {
        JetError::Render(err.to_string())
    }
}
