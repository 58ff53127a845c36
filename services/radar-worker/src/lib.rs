//! Radar overlay worker.
//!
//! Finds the newest volume for each configured station, renders every
//! configured product onto a fixed canvas and writes the PNG with its
//! georeference:
//!
//! - [`locator`]: candidate walk over the remote source with retries
//! - [`pipeline`]: decode, filter, rasterize and store one station's products
//! - [`scheduler`]: concurrent station cycles on a polling interval
//! - [`config`]: YAML configuration

pub mod config;
pub mod locator;
pub mod pipeline;
pub mod scheduler;

pub use config::{ExtentMode, RenderConfig, StationConfig, WorkerConfig};
pub use locator::{
    HttpVolumeSource, LocatedVolume, LocatorConfig, VolumeLocator, VolumePointer, VolumeSource,
};
pub use pipeline::{CycleReport, ProductRender, RenderPipeline, RenderStatus, RenderedSweep};
pub use scheduler::Scheduler;
