//! Geographic extent of a rendered overlay.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in degrees (EPSG:4326).
///
/// Serializes as the `{north, south, east, west}` record map clients expect
/// next to an overlay image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoExtent {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoExtent {
    /// Create a new extent, rejecting inverted or non-finite edges.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self, ExtentError> {
        let extent = Self {
            north,
            south,
            east,
            west,
        };
        extent.validate()?;
        Ok(extent)
    }

    /// Extent centered on a point with the given half-sizes in degrees.
    pub fn around(
        lat: f64,
        lon: f64,
        half_lat_deg: f64,
        half_lon_deg: f64,
    ) -> Result<Self, ExtentError> {
        Self::new(
            lon - half_lon_deg,
            lat - half_lat_deg,
            lon + half_lon_deg,
            lat + half_lat_deg,
        )
    }

    fn validate(&self) -> Result<(), ExtentError> {
        let edges = [self.west, self.south, self.east, self.north];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(ExtentError::NonFinite);
        }
        if self.west >= self.east || self.south >= self.north {
            return Err(ExtentError::Inverted {
                west: self.west,
                south: self.south,
                east: self.east,
                north: self.north,
            });
        }
        Ok(())
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Check if a point is contained within this extent.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtentError {
    #[error("Extent edges must be finite")]
    NonFinite,

    #[error("Inverted extent: west={west} south={south} east={east} north={north}")]
    Inverted {
        west: f64,
        south: f64,
        east: f64,
        north: f64,
    },
}
