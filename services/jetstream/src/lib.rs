//! Jet stream map utility.
//!
//! One linear pipeline per invocation:
//! 1. [`resolve`]: date, level, region and format to a [`RequestDescriptor`]
//! 2. [`fetch`]: a single GET streaming the dataset to a scratch file
//! 3. [`pipeline`]: data file to map image via `netcdf-parser` and `renderer`

pub mod config;
pub mod fetch;
pub mod pipeline;
pub mod resolve;

pub use config::{AppConfig, Credentials, ProviderConfig, RenderSettings};
pub use fetch::{FetchOutcome, Fetcher};
pub use pipeline::{Output, RenderJob};
pub use resolve::{RequestDescriptor, RequestOptions, Resolver};
