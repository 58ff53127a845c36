//! Shared fixtures for the worker integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};

use radar_common::{RadarError, RadarResult, Station, StationId};
use radar_worker::VolumeSource;
use test_utils::{gate_ranges, uniform_azimuths};
use volume::{FieldDocument, SweepDocument, VolumeDocument};

/// In-process volume source that records every requested object name.
#[derive(Default)]
pub struct MockSource {
    objects: HashMap<String, Bytes>,
    /// Names that fail like a timed-out request
    failing: Vec<String>,
    requests: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, name: &str, bytes: Bytes) -> Self {
        self.objects.insert(name.to_string(), bytes);
        self
    }

    pub fn with_failure(mut self, name: &str) -> Self {
        self.failing.push(name.to_string());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl VolumeSource for MockSource {
    async fn fetch(&self, station: &StationId, object_name: &str) -> RadarResult<Option<Bytes>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(object_name.to_string());
        }
        if self.failing.iter().any(|n| n == object_name) {
            return Err(RadarError::SourceRequest {
                object: object_name.to_string(),
                message: format!("connection reset fetching {} data", station),
            });
        }
        Ok(self.objects.get(object_name).cloned())
    }
}

pub fn kffc() -> StationId {
    StationId::parse("KFFC").unwrap()
}

/// 2024-05-01 21:07:42 UTC; the locator anchor floors to 21:05.
pub fn anchor_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 21, 7, 42).unwrap()
}

fn rows(values: &[f32], gates: usize) -> Vec<Vec<Option<f32>>> {
    values
        .chunks(gates)
        .map(|row| row.iter().map(|v| v.is_finite().then_some(*v)).collect())
        .collect()
}

/// JSON volume bytes for KFFC with one 0.5° sweep of `rays` × `gates`
/// (1 km gates from 1 km) and the given fields.
pub fn volume_bytes(rays: usize, gates: usize, fields: &[(&str, Vec<f32>)]) -> Bytes {
    let mut documents = BTreeMap::new();
    for (name, values) in fields {
        documents.insert(
            name.to_string(),
            FieldDocument {
                units: None,
                fill_value: None,
                data: rows(values, gates),
            },
        );
    }
    let document = VolumeDocument {
        station: Station::new(kffc(), 33.3636, -84.5658).unwrap(),
        scan_time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 20, 30, 12).unwrap()),
        sweeps: vec![SweepDocument {
            fixed_angle: 0.5,
            azimuths: uniform_azimuths(rays),
            elevations: None,
            ranges: gate_ranges(1_000.0, 1_000.0, gates),
            transition: None,
            fields: documents,
        }],
    };
    Bytes::from(serde_json::to_vec(&document).unwrap())
}
