//! Product configuration: which field to draw, over what range, with which ramp.
//!
//! One render pipeline serves every product; the differences between
//! reflectivity, velocity and the dual-pol moments live entirely in this table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{RadarError, RadarResult};

/// Colour ramps known to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRampId {
    /// NWS base reflectivity ramp (cyan/blue through green, yellow, red, magenta)
    NwsReflectivity,
    /// NWS radial velocity ramp (greens inbound, reds outbound)
    NwsVelocity,
    /// Diverging ramp used for ZDR and correlation coefficient
    Differential,
}

/// Mean storm motion in m/s; `u` positive toward east, `v` positive toward north.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StormMotion {
    pub u: f32,
    pub v: f32,
}

impl StormMotion {
    pub fn new(u: f32, v: f32) -> Self {
        Self { u, v }
    }

    /// Projection of the storm motion onto a ray at `azimuth_deg`.
    pub fn component(&self, azimuth_deg: f32) -> f32 {
        let az = azimuth_deg.to_radians();
        self.u * az.sin() + self.v * az.cos()
    }
}

impl Default for StormMotion {
    fn default() -> Self {
        Self { u: -10.0, v: -5.0 }
    }
}

/// Which gate-quality rules a product enables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Exclude gates holding fill/non-finite values
    #[serde(default = "default_true")]
    pub invalid: bool,

    /// Exclude every gate on antenna-transition rays
    #[serde(default = "default_true")]
    pub transition: bool,

    /// Exclude gates with values below this floor
    #[serde(default)]
    pub below: Option<f32>,
}

fn default_true() -> bool {
    true
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            invalid: true,
            transition: true,
            below: None,
        }
    }
}

/// A single renderable product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    /// Product name as requested by callers
    pub name: String,

    /// Source field in the decoded sweep
    pub field: String,

    /// Value mapped to the first ramp colour
    pub vmin: f32,

    /// Value mapped to the last ramp colour
    pub vmax: f32,

    pub ramp: ColorRampId,

    /// Human-readable label with units
    pub label: String,

    #[serde(default)]
    pub filter: FilterSettings,

    /// When set, the source field is corrected for storm motion before filtering
    #[serde(default)]
    pub storm_motion: Option<StormMotion>,
}

impl ProductConfig {
    pub fn new(
        name: impl Into<String>,
        field: impl Into<String>,
        vmin: f32,
        vmax: f32,
        ramp: ColorRampId,
        label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            vmin,
            vmax,
            ramp,
            label: label.into(),
            filter: FilterSettings::default(),
            storm_motion: None,
        }
    }

    pub fn with_floor(mut self, floor: f32) -> Self {
        self.filter.below = Some(floor);
        self
    }

    pub fn with_storm_motion(mut self, motion: StormMotion) -> Self {
        self.storm_motion = Some(motion);
        self
    }

    pub fn is_storm_relative(&self) -> bool {
        self.storm_motion.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.field.is_empty() {
            return Err("field must not be empty".to_string());
        }
        if !self.vmin.is_finite() || !self.vmax.is_finite() || self.vmin >= self.vmax {
            return Err(format!(
                "display range [{}, {}] must be finite and increasing",
                self.vmin, self.vmax
            ));
        }
        Ok(())
    }
}

/// Product name -> configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductTable {
    products: BTreeMap<String, ProductConfig>,
}

impl ProductTable {
    /// The products the overlay service ships with.
    pub fn builtin() -> Self {
        let mut table = Self::default();
        table.insert(
            ProductConfig::new(
                "reflectivity",
                "reflectivity",
                -32.0,
                64.0,
                ColorRampId::NwsReflectivity,
                "Reflectivity (dBZ)",
            )
            .with_floor(-32.0),
        );
        table.insert(ProductConfig::new(
            "velocity",
            "velocity",
            -30.0,
            30.0,
            ColorRampId::NwsVelocity,
            "Radial Velocity (m/s)",
        ));
        table.insert(ProductConfig::new(
            "differential_reflectivity",
            "differential_reflectivity",
            -4.0,
            8.0,
            ColorRampId::Differential,
            "Differential Reflectivity (dB)",
        ));
        table.insert(ProductConfig::new(
            "cross_correlation_ratio",
            "cross_correlation_ratio",
            0.5,
            1.05,
            ColorRampId::Differential,
            "Correlation Coefficient",
        ));
        table.insert(
            ProductConfig::new(
                "storm_relative_velocity",
                "velocity",
                -30.0,
                30.0,
                ColorRampId::NwsVelocity,
                "Storm Relative Velocity (m/s)",
            )
            .with_storm_motion(StormMotion::default()),
        );
        table
    }

    /// Insert or replace a product, keyed by its name.
    pub fn insert(&mut self, product: ProductConfig) {
        self.products.insert(product.name.clone(), product);
    }

    /// Look up a product, failing with `UnsupportedProduct` if unknown.
    pub fn get(&self, name: &str) -> RadarResult<&ProductConfig> {
        self.products
            .get(name)
            .ok_or_else(|| RadarError::UnsupportedProduct(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.products.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.products.keys().map(String::as_str).collect()
    }

    /// Overlay `other` on top of this table; entries in `other` win.
    pub fn merge(&mut self, other: ProductTable) {
        for (_, product) in other.products {
            self.insert(product);
        }
    }

    pub fn validate(&self) -> RadarResult<()> {
        for (key, product) in &self.products {
            if key != &product.name {
                return Err(RadarError::ConfigError(format!(
                    "product key '{}' does not match name '{}'",
                    key, product.name
                )));
            }
            product
                .validate()
                .map_err(|e| RadarError::ConfigError(format!("{}: {}", key, e)))?;
        }
        Ok(())
    }
}
