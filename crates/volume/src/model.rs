//! Decoded radar volume: sweeps, per-ray geometry and named gate fields.
//!
//! Everything here is built once by a [`crate::VolumeDecoder`] and read-only
//! afterwards. Derived products (masks, storm-relative fields, coordinates)
//! are computed alongside, never written back.

use std::collections::BTreeMap;

use radar_common::{RadarError, RadarResult, ScanTime, Station};

/// A scalar field laid out as `[ray, gate]` in row-major order.
///
/// Missing/fill values are stored as NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldData {
    rays: usize,
    gates: usize,
    values: Vec<f32>,
    units: Option<String>,
}

impl FieldData {
    pub fn new(rays: usize, gates: usize, values: Vec<f32>) -> RadarResult<Self> {
        if values.len() != rays * gates {
            return Err(RadarError::DecodeFailure(format!(
                "field has {} values, expected {} rays x {} gates",
                values.len(),
                rays,
                gates
            )));
        }
        Ok(Self {
            rays,
            gates,
            values,
            units: None,
        })
    }

    /// A field with every gate set to `value`.
    pub fn filled(rays: usize, gates: usize, value: f32) -> Self {
        Self {
            rays,
            gates,
            values: vec![value; rays * gates],
            units: None,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    pub fn rays(&self) -> usize {
        self.rays
    }

    pub fn gates(&self) -> usize {
        self.gates
    }

    /// `(rays, gates)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rays, self.gates)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Raw value at a gate, `None` when the index is out of range.
    #[inline]
    pub fn get(&self, ray: usize, gate: usize) -> Option<f32> {
        if ray >= self.rays || gate >= self.gates {
            return None;
        }
        Some(self.values[ray * self.gates + gate])
    }

    /// All gates of one ray.
    pub fn ray(&self, ray: usize) -> &[f32] {
        let start = ray * self.gates;
        &self.values[start..start + self.gates]
    }

    /// Build a new field of the same shape by transforming each ray.
    pub fn map_rays<F>(&self, mut f: F) -> FieldData
    where
        F: FnMut(usize, f32) -> f32,
    {
        let mut values = Vec::with_capacity(self.values.len());
        for ray in 0..self.rays {
            values.extend(self.ray(ray).iter().map(|&v| f(ray, v)));
        }
        FieldData {
            rays: self.rays,
            gates: self.gates,
            values,
            units: self.units.clone(),
        }
    }
}

/// One antenna rotation at a fixed elevation.
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    /// Target elevation angle in degrees
    pub fixed_angle: f32,
    /// Azimuth of each ray, degrees clockwise from north
    azimuths: Vec<f32>,
    /// Measured elevation of each ray, degrees
    elevations: Vec<f32>,
    /// Distance to the center of each gate, meters
    ranges: Vec<f32>,
    /// Rays collected while the antenna was moving between elevations
    transition: Vec<bool>,
    fields: BTreeMap<String, FieldData>,
}

impl Sweep {
    /// Create a sweep whose rays all sit at `fixed_angle`.
    pub fn new(fixed_angle: f32, azimuths: Vec<f32>, ranges: Vec<f32>) -> Self {
        let rays = azimuths.len();
        Self {
            fixed_angle,
            elevations: vec![fixed_angle; rays],
            transition: vec![false; rays],
            azimuths,
            ranges,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_elevations(mut self, elevations: Vec<f32>) -> Self {
        self.elevations = elevations;
        self
    }

    pub fn with_transition(mut self, transition: Vec<bool>) -> Self {
        self.transition = transition;
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, data: FieldData) -> Self {
        self.fields.insert(name.into(), data);
        self
    }

    pub fn ray_count(&self) -> usize {
        self.azimuths.len()
    }

    pub fn gate_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn azimuths(&self) -> &[f32] {
        &self.azimuths
    }

    pub fn elevations(&self) -> &[f32] {
        &self.elevations
    }

    pub fn ranges(&self) -> &[f32] {
        &self.ranges
    }

    pub fn is_transition(&self, ray: usize) -> bool {
        self.transition.get(ray).copied().unwrap_or(false)
    }

    pub fn transition_flags(&self) -> &[bool] {
        &self.transition
    }

    /// Capability query: does this sweep carry `name`?
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldData> {
        self.fields.get(name)
    }

    /// Like [`Sweep::field`], but reports absence as `NoUsableData`.
    pub fn require_field(&self, name: &str) -> RadarResult<&FieldData> {
        self.fields.get(name).ok_or_else(|| {
            RadarError::NoUsableData(format!(
                "sweep at {:.1}° has no '{}' field (available: {})",
                self.fixed_angle,
                name,
                self.field_names().join(", ")
            ))
        })
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Distance to the center of the last gate, meters.
    pub fn max_range(&self) -> f32 {
        self.ranges.last().copied().unwrap_or(0.0)
    }

    /// Check the shape invariants: one azimuth, elevation and transition flag
    /// per ray, strictly increasing ranges, and every field `[rays, gates]`.
    pub fn validate(&self) -> RadarResult<()> {
        let rays = self.ray_count();
        let gates = self.gate_count();

        if rays == 0 || gates == 0 {
            return Err(RadarError::DecodeFailure(format!(
                "sweep at {:.1}° is empty ({} rays, {} gates)",
                self.fixed_angle, rays, gates
            )));
        }
        if self.elevations.len() != rays || self.transition.len() != rays {
            return Err(RadarError::DecodeFailure(format!(
                "sweep at {:.1}° has {} azimuths, {} elevations, {} transition flags",
                self.fixed_angle,
                rays,
                self.elevations.len(),
                self.transition.len()
            )));
        }
        if self
            .azimuths
            .iter()
            .chain(self.elevations.iter())
            .any(|a| !a.is_finite())
        {
            return Err(RadarError::DecodeFailure(
                "non-finite ray angle".to_string(),
            ));
        }
        if self.ranges.iter().any(|r| !r.is_finite() || *r < 0.0)
            || self.ranges.windows(2).any(|w| w[1] <= w[0])
        {
            return Err(RadarError::DecodeFailure(
                "gate ranges must be finite, non-negative and strictly increasing".to_string(),
            ));
        }
        for (name, field) in &self.fields {
            if field.shape() != (rays, gates) {
                return Err(RadarError::DecodeFailure(format!(
                    "field '{}' has shape {:?}, sweep is {:?}",
                    name,
                    field.shape(),
                    (rays, gates)
                )));
            }
        }
        Ok(())
    }
}

/// One complete scan cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// The site that produced the volume, with its antenna location
    pub station: Station,
    pub scan_time: Option<ScanTime>,
    pub sweeps: Vec<Sweep>,
}

impl Volume {
    pub fn new(station: Station, sweeps: Vec<Sweep>) -> Self {
        Self {
            station,
            scan_time: None,
            sweeps,
        }
    }

    pub fn with_scan_time(mut self, scan_time: ScanTime) -> Self {
        self.scan_time = Some(scan_time);
        self
    }

    pub fn sweep_count(&self) -> usize {
        self.sweeps.len()
    }

    /// Sweep by index (0 is the lowest elevation).
    pub fn sweep(&self, index: usize) -> RadarResult<&Sweep> {
        self.sweeps.get(index).ok_or_else(|| {
            RadarError::NoUsableData(format!(
                "volume has {} sweeps, sweep {} requested",
                self.sweeps.len(),
                index
            ))
        })
    }

    pub fn validate(&self) -> RadarResult<()> {
        if self.sweeps.is_empty() {
            return Err(RadarError::DecodeFailure("volume has no sweeps".to_string()));
        }
        for (i, sweep) in self.sweeps.iter().enumerate() {
            sweep.validate().map_err(|e| match e {
                RadarError::DecodeFailure(msg) => {
                    RadarError::DecodeFailure(format!("sweep {}: {}", i, msg))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}
