//! Radar volume model and decoders.
//!
//! A [`Volume`] is an ordered list of [`Sweep`]s, each holding per-ray
//! azimuth/elevation, per-gate range and named `[ray, gate]` fields.

pub mod decoder;
pub mod model;

pub use decoder::{
    maybe_decompress, FieldDocument, JsonVolumeDecoder, SweepDocument, VolumeDecoder,
    VolumeDocument,
};
pub use model::{FieldData, Sweep, Volume};
