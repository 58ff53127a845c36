//! Common types and utilities shared across the radar overlay crates.

pub mod bbox;
pub mod error;
pub mod product;
pub mod station;
pub mod time;

pub use bbox::{ExtentError, GeoExtent};
pub use error::{RadarError, RadarResult};
pub use product::{ColorRampId, FilterSettings, ProductConfig, ProductTable, StormMotion};
pub use station::{Station, StationId};
pub use time::{ScanTime, TimeParseError};
