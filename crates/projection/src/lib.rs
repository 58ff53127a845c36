//! Radar gate geometry.
//!
//! Converts antenna coordinates (range, azimuth, elevation) to geographic
//! coordinates around a station and back. Implemented from the closed-form
//! formulas without external projection libraries.
//!
//! ```text
//! (range, az, el) ──polar──► (east, north, up) ──geographic──► (lat, lon)
//!                 ◄─────────                   ◄──────────────
//! ```

pub mod geographic;
pub mod grid;
pub mod polar;
pub mod transform;

pub use geographic::{cartesian_to_geographic, geographic_to_cartesian, GeoModel};
pub use grid::{GateLocator, GeoGrid};
pub use polar::{antenna_to_cartesian, cartesian_to_antenna, BeamModel, Enu};
pub use transform::CoordinateTransform;
