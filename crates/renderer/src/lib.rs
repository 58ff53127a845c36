//! Radar overlay rendering.
//!
//! - [`colormap`]: product colour ramps with clamped linear scaling
//! - [`raster`]: masked sweep field to a fixed-extent RGBA raster
//! - [`georef`]: bounds record and world file for the same canvas
//! - [`png`]: indexed/RGBA PNG encoding

pub mod colormap;
pub mod georef;
pub mod png;
pub mod raster;

pub use colormap::{Color, ColorRamp};
pub use georef::{Georeference, WorldFile};
pub use png::create_png_auto;
pub use raster::{rasterize_sweep, Canvas, RasterImage};
