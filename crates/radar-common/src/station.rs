//! Radar station identity and location.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RadarError;

/// Four-letter radar site identifier (e.g. `KFFC`), always upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationId(String);

impl StationId {
    /// Parse and normalize a station identifier.
    pub fn parse(s: &str) -> Result<Self, RadarError> {
        let trimmed = s.trim();
        if trimmed.len() != 4 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RadarError::InvalidStation(s.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StationId {
    type Err = RadarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StationId {
    type Error = RadarError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StationId> for String {
    fn from(id: StationId) -> Self {
        id.0
    }
}

/// A radar site and its fixed antenna location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    /// Latitude in degrees north
    pub latitude: f64,
    /// Longitude in degrees east
    pub longitude: f64,
    /// Antenna altitude above mean sea level, meters
    #[serde(default)]
    pub altitude_m: f64,
}

impl Station {
    pub fn new(id: StationId, latitude: f64, longitude: f64) -> Result<Self, RadarError> {
        if !(-90.0..=90.0).contains(&latitude) || !latitude.is_finite() {
            return Err(RadarError::InvalidParameter {
                param: "latitude".to_string(),
                message: format!("{} is outside [-90, 90]", latitude),
            });
        }
        if !(-180.0..=180.0).contains(&longitude) || !longitude.is_finite() {
            return Err(RadarError::InvalidParameter {
                param: "longitude".to_string(),
                message: format!("{} is outside [-180, 180]", longitude),
            });
        }
        Ok(Self {
            id,
            latitude,
            longitude,
            altitude_m: 0.0,
        })
    }

    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude_m = altitude_m;
        self
    }
}
