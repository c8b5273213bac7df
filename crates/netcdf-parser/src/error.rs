//! Error types for NetCDF parsing operations.

use jet_common::JetError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Requested pressure level is not in the file
    #[error("No {0} hPa level in data file")]
    LevelNotFound(u16),

    /// Requested date is not in the file's time axis
    #[error("No time step on {0} in data file")]
    TimeNotFound(String),
}

impl From<netcdf::Error> for NetCdfError {
    fn from(err: netcdf::Error) -> Self {
        NetCdfError::InvalidFormat(err.to_string())
    }
}

impl From<NetCdfError> for JetError {
    fn from(err: NetCdfError) -> Self {
        JetError::Parse(err.to_string())
    }
}
