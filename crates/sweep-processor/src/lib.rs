//! Per-sweep processing ahead of projection and rendering.
//!
//! - [`GateFilter`] builds a [`GateMask`] of gates that must not be drawn
//! - [`MaskedField`] pairs a field with its mask without copying either
//! - [`storm_relative`] derives a storm-relative velocity field
//!
//! ```text
//! Sweep field ──► storm_relative (optional) ──► GateFilter::apply ──► MaskedField
//! ```

pub mod filter;
pub mod mask;
pub mod storm;

pub use filter::{FilterRule, GateFilter};
pub use mask::{GateMask, MaskedField};
pub use storm::storm_relative;
