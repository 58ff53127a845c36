//! Volume decoders.
//!
//! The archive wire format is owned by whichever decoder is plugged in; the
//! pipeline only sees [`VolumeDecoder`]. [`JsonVolumeDecoder`] reads the
//! JSON volume document used for fixtures, replays and hand-built scans.

use std::collections::BTreeMap;
use std::io::Read;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use radar_common::{RadarError, RadarResult, ScanTime, Station};

use crate::model::{FieldData, Sweep, Volume};

/// gzip member header magic
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Turns raw volume bytes into the [`Volume`] model.
pub trait VolumeDecoder: Send + Sync {
    /// Decoder name, for logs.
    fn name(&self) -> &'static str;

    /// Decode a complete volume. Any structural problem is a `DecodeFailure`.
    fn decode(&self, bytes: &[u8]) -> RadarResult<Volume>;
}

/// Inflate gzip-wrapped bytes; anything else is returned as-is.
pub fn maybe_decompress(bytes: &[u8]) -> RadarResult<std::borrow::Cow<'_, [u8]>> {
    if bytes.len() >= 2 && bytes[..2] == GZIP_MAGIC {
        let mut decoder = GzDecoder::new(bytes);
        let mut out = Vec::with_capacity(bytes.len() * 4);
        decoder
            .read_to_end(&mut out)
            .map_err(|e| RadarError::DecodeFailure(format!("gzip: {}", e)))?;
        debug!(compressed = bytes.len(), inflated = out.len(), "Inflated gzip volume");
        Ok(std::borrow::Cow::Owned(out))
    } else {
        Ok(std::borrow::Cow::Borrowed(bytes))
    }
}

/// On-disk JSON form of a volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeDocument {
    pub station: Station,
    #[serde(default)]
    pub scan_time: Option<DateTime<Utc>>,
    pub sweeps: Vec<SweepDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepDocument {
    pub fixed_angle: f32,
    pub azimuths: Vec<f32>,
    /// Per-ray elevations; defaults to `fixed_angle` for every ray
    #[serde(default)]
    pub elevations: Option<Vec<f32>>,
    /// Gate center ranges in meters
    pub ranges: Vec<f32>,
    /// Per-ray antenna transition flags; defaults to all false
    #[serde(default)]
    pub transition: Option<Vec<bool>>,
    pub fields: BTreeMap<String, FieldDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDocument {
    #[serde(default)]
    pub units: Option<String>,
    /// Sentinel written by the producer for "no measurement"
    #[serde(default)]
    pub fill_value: Option<f32>,
    /// One row per ray; `null` marks a missing gate
    pub data: Vec<Vec<Option<f32>>>,
}

impl FieldDocument {
    fn into_field(self, name: &str, gates: usize) -> RadarResult<FieldData> {
        let rays = self.data.len();
        let mut values = Vec::with_capacity(rays * gates);
        for (i, row) in self.data.into_iter().enumerate() {
            if row.len() != gates {
                return Err(RadarError::DecodeFailure(format!(
                    "field '{}' ray {} has {} gates, expected {}",
                    name,
                    i,
                    row.len(),
                    gates
                )));
            }
            values.extend(row.into_iter().map(|v| match (v, self.fill_value) {
                (Some(v), Some(fill)) if v == fill => f32::NAN,
                (Some(v), _) => v,
                (None, _) => f32::NAN,
            }));
        }
        let field = FieldData::new(rays, gates, values)?;
        Ok(match self.units {
            Some(units) => field.with_units(units),
            None => field,
        })
    }
}

impl SweepDocument {
    fn into_sweep(self) -> RadarResult<Sweep> {
        let gates = self.ranges.len();
        let mut sweep = Sweep::new(self.fixed_angle, self.azimuths, self.ranges);
        if let Some(elevations) = self.elevations {
            sweep = sweep.with_elevations(elevations);
        }
        if let Some(transition) = self.transition {
            sweep = sweep.with_transition(transition);
        }
        for (name, field) in self.fields {
            let data = field.into_field(&name, gates)?;
            sweep = sweep.with_field(name, data);
        }
        Ok(sweep)
    }
}

impl VolumeDocument {
    pub fn into_volume(self) -> RadarResult<Volume> {
        let sweeps = self
            .sweeps
            .into_iter()
            .map(SweepDocument::into_sweep)
            .collect::<RadarResult<Vec<_>>>()?;
        let mut volume = Volume::new(self.station, sweeps);
        if let Some(t) = self.scan_time {
            volume = volume.with_scan_time(ScanTime::new(t));
        }
        volume.validate()?;
        Ok(volume)
    }
}

/// Decoder for [`VolumeDocument`] JSON, optionally gzip-compressed.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonVolumeDecoder;

impl VolumeDecoder for JsonVolumeDecoder {
    fn name(&self) -> &'static str {
        "json"
    }

    fn decode(&self, bytes: &[u8]) -> RadarResult<Volume> {
        let raw = maybe_decompress(bytes)?;
        let document: VolumeDocument = serde_json::from_slice(&raw)
            .map_err(|e| RadarError::DecodeFailure(format!("volume document: {}", e)))?;
        let volume = document.into_volume()?;
        debug!(
            station = %volume.station.id,
            sweeps = volume.sweep_count(),
            "Decoded JSON volume"
        );
        Ok(volume)
    }
}
