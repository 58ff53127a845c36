//! Scan timestamps and the `STATION_YYYYMMDD_HHMM` object naming scheme.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::station::StationId;

/// Format used in remote object names.
const OBJECT_TIME_FORMAT: &str = "%Y%m%d_%H%M";

/// Nominal start time of a volume scan, at minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScanTime(DateTime<Utc>);

impl ScanTime {
    /// Create a scan time, truncating seconds and sub-seconds.
    pub fn new(time: DateTime<Utc>) -> Self {
        let truncated = time
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(time);
        Self(truncated)
    }

    /// Round down to the previous multiple of `granularity_minutes` in the hour.
    ///
    /// A granularity of zero or one leaves the minute untouched.
    pub fn floor_to(time: DateTime<Utc>, granularity_minutes: u32) -> Self {
        let base = Self::new(time);
        if granularity_minutes <= 1 {
            return base;
        }
        let excess = base.0.minute() % granularity_minutes;
        Self(base.0 - Duration::minutes(excess as i64))
    }

    /// The scan time `minutes` earlier.
    pub fn minus_minutes(&self, minutes: i64) -> Self {
        Self(self.0 - Duration::minutes(minutes))
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Remote object name for this scan, e.g. `KFFC_20240115_1235`.
    pub fn object_name(&self, station: &StationId) -> String {
        format!("{}_{}", station, self.0.format(OBJECT_TIME_FORMAT))
    }

    /// Compact stamp used in history artifact names, e.g. `202401151235`.
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d%H%M").to_string()
    }

    /// Parse an object name back into its station and scan time.
    pub fn from_object_name(name: &str) -> Result<(StationId, ScanTime), TimeParseError> {
        let (station, stamp) = name
            .split_once('_')
            .ok_or_else(|| TimeParseError::InvalidObjectName(name.to_string()))?;
        let station = StationId::parse(station)
            .map_err(|_| TimeParseError::InvalidObjectName(name.to_string()))?;
        // Tolerate suffixes such as ".gz" or "_V06"
        let stamp: String = stamp.chars().take(13).collect();
        let naive = NaiveDateTime::parse_from_str(&stamp, OBJECT_TIME_FORMAT)
            .map_err(|_| TimeParseError::InvalidObjectName(name.to_string()))?;
        Ok((station, ScanTime(Utc.from_utc_datetime(&naive))))
    }
}

impl fmt::Display for ScanTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%MZ"))
    }
}

impl From<DateTime<Utc>> for ScanTime {
    fn from(time: DateTime<Utc>) -> Self {
        Self::new(time)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Not a STATION_YYYYMMDD_HHMM object name: {0}")]
    InvalidObjectName(String),
}
