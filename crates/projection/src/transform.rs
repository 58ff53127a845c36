//! Gate ↔ geographic transform for one radar site.

use radar_common::{GeoExtent, RadarError, RadarResult, Station};

use crate::geographic::{cartesian_to_geographic, geographic_to_cartesian, GeoModel};
use crate::polar::{antenna_to_cartesian, cartesian_to_antenna, BeamModel};

/// Number of bearings sampled when bounding a range ring.
const RING_SAMPLES: usize = 360;

/// Beam and surface models anchored at a station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    pub station_lat: f64,
    pub station_lon: f64,
    pub beam: BeamModel,
    pub geo: GeoModel,
}

impl CoordinateTransform {
    /// 4/3-Earth beam over an azimuthal equidistant surface.
    pub fn new(station: &Station) -> Self {
        Self {
            station_lat: station.latitude,
            station_lon: station.longitude,
            beam: BeamModel::default(),
            geo: GeoModel::default(),
        }
    }

    pub fn with_beam(mut self, beam: BeamModel) -> Self {
        self.beam = beam;
        self
    }

    pub fn with_geo(mut self, geo: GeoModel) -> Self {
        self.geo = geo;
        self
    }

    /// (lat, lon) of the gate at `range_m` along a ray.
    pub fn gate_to_geographic(&self, range_m: f64, azimuth_deg: f64, elevation_deg: f64) -> (f64, f64) {
        let enu = antenna_to_cartesian(range_m, azimuth_deg, elevation_deg, self.beam);
        cartesian_to_geographic(
            enu.east,
            enu.north,
            self.station_lat,
            self.station_lon,
            self.geo,
        )
    }

    /// East/north offset of a point from the station, meters.
    pub fn geographic_to_cartesian(&self, lat: f64, lon: f64) -> (f64, f64) {
        geographic_to_cartesian(lat, lon, self.station_lat, self.station_lon, self.geo)
    }

    /// (slant range, azimuth) of the gate at (lat, lon) on a ray at `elevation_deg`.
    pub fn geographic_to_gate(&self, lat: f64, lon: f64, elevation_deg: f64) -> Option<(f64, f64)> {
        let (east, north) = self.geographic_to_cartesian(lat, lon);
        cartesian_to_antenna(east, north, elevation_deg, self.beam)
    }

    /// Bounding box of the ring `radius_m` meters (ground distance) from the station.
    pub fn extent_for_radius(&self, radius_m: f64) -> RadarResult<GeoExtent> {
        if !(radius_m.is_finite() && radius_m > 0.0) {
            return Err(RadarError::InvalidParameter {
                param: "radius".to_string(),
                message: format!("radius must be positive, got {}", radius_m),
            });
        }

        let mut bounds = Bounds::default();
        for i in 0..RING_SAMPLES {
            let az = (i as f64 * 360.0 / RING_SAMPLES as f64).to_radians();
            let (lat, lon) = cartesian_to_geographic(
                radius_m * az.sin(),
                radius_m * az.cos(),
                self.station_lat,
                self.station_lon,
                self.geo,
            );
            bounds.include(lat, lon);
        }
        bounds.into_extent()
    }
}

/// Running min/max over geographic points.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Bounds {
    north: f64,
    south: f64,
    east: f64,
    west: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            north: f64::NEG_INFINITY,
            south: f64::INFINITY,
            east: f64::NEG_INFINITY,
            west: f64::INFINITY,
        }
    }
}

impl Bounds {
    pub(crate) fn include(&mut self, lat: f64, lon: f64) {
        self.north = self.north.max(lat);
        self.south = self.south.min(lat);
        self.east = self.east.max(lon);
        self.west = self.west.min(lon);
    }

    pub(crate) fn into_extent(self) -> RadarResult<GeoExtent> {
        GeoExtent::new(self.west, self.south, self.east, self.north)
            .map_err(|e| RadarError::ProjectionError(format!("degenerate extent: {}", e)))
    }
}
