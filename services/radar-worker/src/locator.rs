//! Volume locator: finds the newest published volume for a station.
//!
//! The source publishes `STATION_YYYYMMDD_HHMM` objects on a loose schedule
//! and lags by an unknown amount, so the locator walks backwards from "now":
//!
//! ```text
//! attempt 1:  T, T-5, T-10, ... T-55   (max_candidates probes)
//!   sleep retry_delay
//! attempt 2:  T, T-5, ...
//!   ...
//! attempt N exhausted -> SourceUnavailable
//! ```
//!
//! A probe that errors (timeout, connection reset) counts as "not there yet".
//! Only running out of attempts is an error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use metrics::counter;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use radar_common::{RadarError, RadarResult, ScanTime, StationId};

/// Remote store of raw volumes, addressed by station and object name.
#[async_trait]
pub trait VolumeSource: Send + Sync {
    /// Fetch one object. `Ok(None)` means the object is not published (yet).
    async fn fetch(&self, station: &StationId, object_name: &str) -> RadarResult<Option<Bytes>>;
}

/// Volume source over plain HTTP: `{base_url}/{STATION}/{object_name}`.
#[derive(Debug, Clone)]
pub struct HttpVolumeSource {
    client: Client,
    base_url: String,
}

impl HttpVolumeSource {
    /// `timeout` bounds each request so one stalled probe cannot hold up
    /// the rest of the candidate walk.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> RadarResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| RadarError::ConfigError(format!("HTTP client: {}", e)))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn object_url(&self, station: &StationId, object_name: &str) -> String {
        format!("{}/{}/{}", self.base_url, station, object_name)
    }
}

#[async_trait]
impl VolumeSource for HttpVolumeSource {
    async fn fetch(&self, station: &StationId, object_name: &str) -> RadarResult<Option<Bytes>> {
        let url = self.object_url(station, object_name);
        let request_failed = |e: reqwest::Error| {
            debug!(url = %url, error = %e, "Request failed");
            RadarError::SourceRequest {
                object: object_name.to_string(),
                message: e.to_string(),
            }
        };

        let response = self.client.get(&url).send().await.map_err(request_failed)?;
        match response.status() {
            StatusCode::OK => {
                let bytes = response.bytes().await.map_err(request_failed)?;
                Ok(Some(bytes))
            }
            status => {
                debug!(url = %url, status = %status, "Object not available");
                Ok(None)
            }
        }
    }
}

/// Candidate walk and retry budget.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    pub granularity_minutes: u32,
    pub step_minutes: u32,
    pub max_candidates: usize,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            granularity_minutes: 5,
            step_minutes: 5,
            max_candidates: 12,
            max_attempts: 3,
            retry_delay: Duration::from_secs(30),
        }
    }
}

/// A volume found by [`VolumeLocator::locate`].
#[derive(Debug, Clone)]
pub struct LocatedVolume {
    pub station: StationId,
    pub scan_time: ScanTime,
    pub object_name: String,
    pub bytes: Bytes,
    /// Outer attempt that found it, starting at 1
    pub attempt: u32,
}

impl LocatedVolume {
    pub fn pointer(&self, located_at: DateTime<Utc>) -> VolumePointer {
        VolumePointer {
            station: self.station.clone(),
            object_name: self.object_name.clone(),
            scan_time: self.scan_time.datetime(),
            located_at,
        }
    }
}

/// Persisted record of the most recently located volume (`{STATION}_latest.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumePointer {
    pub station: StationId,
    pub object_name: String,
    pub scan_time: DateTime<Utc>,
    pub located_at: DateTime<Utc>,
}

pub struct VolumeLocator {
    source: Arc<dyn VolumeSource>,
    config: LocatorConfig,
}

impl VolumeLocator {
    pub fn new(source: Arc<dyn VolumeSource>, config: LocatorConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Candidate scan times and object names, newest first.
    pub fn candidates(&self, station: &StationId, now: DateTime<Utc>) -> Vec<(ScanTime, String)> {
        let anchor = ScanTime::floor_to(now, self.config.granularity_minutes);
        let step = i64::from(self.config.step_minutes.max(1));
        (0..self.config.max_candidates)
            .map(|i| {
                let time = anchor.minus_minutes(step * i as i64);
                let name = time.object_name(station);
                (time, name)
            })
            .collect()
    }

    /// Find the newest available volume at or before `now`.
    #[instrument(skip(self, station), fields(station = %station))]
    pub async fn locate(&self, station: &StationId, now: DateTime<Utc>) -> RadarResult<LocatedVolume> {
        let candidates = self.candidates(station, now);

        for attempt in 1..=self.config.max_attempts {
            if let Some(found) = self.probe_all(station, &candidates, attempt).await {
                info!(
                    object = %found.object_name,
                    attempt,
                    size = found.bytes.len(),
                    "Located volume"
                );
                return Ok(found);
            }

            if attempt < self.config.max_attempts {
                warn!(
                    attempt,
                    max_attempts = self.config.max_attempts,
                    candidates = candidates.len(),
                    delay_secs = self.config.retry_delay.as_secs_f64(),
                    "No volume published yet, retrying"
                );
                tokio::time::sleep(self.config.retry_delay).await;
            } else {
                warn!(attempt, candidates = candidates.len(), "No volume published");
            }
        }

        counter!("radar_locator_exhausted_total").increment(1);
        error!(
            attempts = self.config.max_attempts,
            candidates = candidates.len(),
            "Locator budget exhausted"
        );
        Err(RadarError::SourceUnavailable {
            station: station.to_string(),
            attempts: self.config.max_attempts,
            candidates: candidates.len(),
        })
    }

    /// One pass over the candidates, newest first; stops at the first hit.
    async fn probe_all(
        &self,
        station: &StationId,
        candidates: &[(ScanTime, String)],
        attempt: u32,
    ) -> Option<LocatedVolume> {
        for (scan_time, object_name) in candidates {
            counter!("radar_locator_probes_total").increment(1);
            match self.source.fetch(station, object_name).await {
                Ok(Some(bytes)) => {
                    return Some(LocatedVolume {
                        station: station.clone(),
                        scan_time: *scan_time,
                        object_name: object_name.clone(),
                        bytes,
                        attempt,
                    });
                }
                Ok(None) => debug!(object = %object_name, "Not published"),
                Err(e) => debug!(object = %object_name, error = %e, "Probe failed"),
            }
        }
        None
    }
}
