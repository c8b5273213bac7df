//! Common types shared by the jetstream crates.

pub mod bbox;
pub mod error;
pub mod grid;
pub mod level;
pub mod style;
pub mod time;

pub use bbox::{BoundingBox, Region};
pub use error::{JetError, JetResult};
pub use grid::WindGrid;
pub use level::PressureLevel;
pub use style::{ColorStop, StyleConfig, StyleDefinition};
pub use time::{AvailabilityWindow, CfTimeUnits, DateSpan};
