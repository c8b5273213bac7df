//! Error types for the jetstream pipeline.

use thiserror::Error;

/// Result type alias using JetError.
pub type JetResult<T> = Result<T, JetError>;

/// Primary error type for a pipeline run.
///
/// Each variant maps to one pipeline stage so the CLI can report a stable
/// exit code.
#[derive(Debug, Error)]
pub enum JetError {
    // === Resolver ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Fetcher ===
    #[error("Fetch failed: {0}")]
    Fetch(String),

    // === Renderer ===
    #[error("Failed to parse data file: {0}")]
    Parse(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    // === Ambient ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JetError {
    /// Shorthand for an `InvalidParameter` error.
    pub fn invalid(param: impl Into<String>, message: impl Into<String>) -> Self {
        JetError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Process exit code reported for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            JetError::InvalidParameter { .. } => 2,
            JetError::Fetch(_) => 3,
            JetError::Parse(_) => 4,
            JetError::Render(_) => 5,
            JetError::Config(_) | JetError::Io(_) => 1,
        }
    }

    /// Short machine-readable name of the error kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            JetError::InvalidParameter { .. } => "invalid_parameter",
            JetError::Fetch(_) => "fetch",
            JetError::Parse(_) => "parse",
            JetError::Render(_) => "render",
            JetError::Config(_) => "config",
            JetError::Io(_) => "io",
        }
    }
}

impl From<serde_json::Error> for JetError {
    fn from(err: serde_json::Error) -> Self {
        JetError::Config(format!("JSON error: {}", err))
    }
}
