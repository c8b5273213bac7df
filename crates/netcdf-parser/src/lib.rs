//! NetCDF reader for reanalysis wind data.
//!
//! Reads the u/v wind components of pressure-level analyses (classic or
//! netCDF-4 files) through the native netcdf library and slices them into
//! [`WindGrid`](jet_common::WindGrid)s, one per time step and level.
//!
//! ```no_run
//! use jet_common::PressureLevel;
//! use netcdf_parser::WindDataset;
//!
//! let dataset = WindDataset::open("/tmp/era-interim.nc")?;
//! let grid = dataset.grid(0, PressureLevel::JETSTREAM)?;
//! println!("{} x {}", grid.width(), grid.height());
//! # Ok::<(), netcdf_parser::NetCdfError>(())
//! ```

pub mod dataset;
pub mod error;
pub mod inspect;
pub mod native;

pub use dataset::WindDataset;
pub use error::{NetCdfError, NetCdfResult};
pub use inspect::{summarize, VariableSummary};
pub use native::{sniff_format, FileFormat};
