//! Per-gate geographic grid and its inverse, the nearest-gate locator.

use radar_common::{GeoExtent, RadarResult};
use volume::Sweep;

use crate::polar::{normalize_azimuth, slant_range_for_ground};
use crate::transform::{Bounds, CoordinateTransform};

/// Ray width assumed when a sweep has a single ray, degrees.
const DEFAULT_RAY_WIDTH_DEG: f64 = 1.0;

/// Gate length assumed when a sweep has a single gate, meters.
const DEFAULT_GATE_LENGTH_M: f64 = 250.0;

/// Latitude/longitude of every gate of a sweep, row-major `[ray, gate]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoGrid {
    rays: usize,
    gates: usize,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
}

impl GeoGrid {
    /// Project every gate center of `sweep`, using each ray's own elevation.
    pub fn compute(sweep: &Sweep, transform: &CoordinateTransform) -> Self {
        let rays = sweep.ray_count();
        let gates = sweep.gate_count();
        let mut latitudes = Vec::with_capacity(rays * gates);
        let mut longitudes = Vec::with_capacity(rays * gates);

        for (ray, &az) in sweep.azimuths().iter().enumerate() {
            let el = ray_elevation(sweep, ray);
            for &range in sweep.ranges() {
                let (lat, lon) = transform.gate_to_geographic(range as f64, az as f64, el);
                latitudes.push(lat);
                longitudes.push(lon);
            }
        }

        Self {
            rays,
            gates,
            latitudes,
            longitudes,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rays, self.gates)
    }

    pub fn get(&self, ray: usize, gate: usize) -> Option<(f64, f64)> {
        if ray >= self.rays || gate >= self.gates {
            return None;
        }
        let idx = ray * self.gates + gate;
        Some((self.latitudes[idx], self.longitudes[idx]))
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    /// Footprint of every gate center, masked or not.
    ///
    /// Fails with `ProjectionError` when the gates do not span an area
    /// (empty grid, or all gates on one meridian or parallel).
    pub fn extent(&self) -> RadarResult<GeoExtent> {
        let mut bounds = Bounds::default();
        for (&lat, &lon) in self.latitudes.iter().zip(&self.longitudes) {
            bounds.include(lat, lon);
        }
        bounds.into_extent()
    }
}

fn ray_elevation(sweep: &Sweep, ray: usize) -> f64 {
    sweep
        .elevations()
        .get(ray)
        .copied()
        .unwrap_or(sweep.fixed_angle) as f64
}

#[derive(Debug, Clone, Copy)]
struct RayEntry {
    azimuth: f64,
    index: usize,
    elevation: f64,
}

/// Maps a geographic point back to the gate that covers it.
///
/// A point is covered by the ray with the nearest azimuth when it lies within
/// half the typical ray spacing of it, and by the gate with the nearest range
/// when it lies within half the local gate spacing.
#[derive(Debug, Clone)]
pub struct GateLocator<'a> {
    transform: CoordinateTransform,
    rays: Vec<RayEntry>,
    ranges: &'a [f32],
    ray_tolerance: f64,
}

impl<'a> GateLocator<'a> {
    pub fn new(sweep: &'a Sweep, transform: CoordinateTransform) -> Self {
        let mut rays: Vec<RayEntry> = sweep
            .azimuths()
            .iter()
            .enumerate()
            .map(|(index, &az)| RayEntry {
                azimuth: normalize_azimuth(az as f64),
                index,
                elevation: ray_elevation(sweep, index),
            })
            .collect();
        rays.sort_by(|a, b| a.azimuth.total_cmp(&b.azimuth));

        let ray_tolerance = typical_ray_spacing(&rays) / 2.0;
        Self {
            transform,
            rays,
            ranges: sweep.ranges(),
            ray_tolerance,
        }
    }

    /// Half-width of the azimuth window each ray covers, degrees.
    pub fn ray_tolerance(&self) -> f64 {
        self.ray_tolerance
    }

    /// `(ray, gate)` covering (lat, lon), or `None` outside the sweep.
    pub fn locate(&self, lat: f64, lon: f64) -> Option<(usize, usize)> {
        let (east, north) = self.transform.geographic_to_cartesian(lat, lon);
        let ground = east.hypot(north);
        let azimuth = normalize_azimuth(east.atan2(north).to_degrees());

        let ray = self.nearest_ray(azimuth)?;
        let range = slant_range_for_ground(ground, ray.elevation, self.transform.beam)?;
        let gate = self.nearest_gate(range)?;
        Some((ray.index, gate))
    }

    fn nearest_ray(&self, azimuth: f64) -> Option<RayEntry> {
        if self.rays.is_empty() {
            return None;
        }
        let n = self.rays.len();
        let pos = self.rays.partition_point(|r| r.azimuth < azimuth);
        // Candidates either side of the insertion point, wrapping through north
        let before = self.rays[(pos + n - 1) % n];
        let after = self.rays[pos % n];
        let (best, diff) = [before, after]
            .into_iter()
            .map(|r| (r, circular_diff(r.azimuth, azimuth)))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        (diff <= self.ray_tolerance).then_some(best)
    }

    fn nearest_gate(&self, range: f64) -> Option<usize> {
        let ranges = self.ranges;
        if ranges.is_empty() {
            return None;
        }
        let pos = ranges.partition_point(|&r| (r as f64) < range);
        let gate = if pos == 0 {
            0
        } else if pos == ranges.len() {
            ranges.len() - 1
        } else if range - ranges[pos - 1] as f64 <= ranges[pos] as f64 - range {
            pos - 1
        } else {
            pos
        };

        let offset = range - ranges[gate] as f64;
        let spacing = if ranges.len() < 2 {
            DEFAULT_GATE_LENGTH_M
        } else if offset < 0.0 {
            let g = gate.max(1);
            (ranges[g] - ranges[g - 1]) as f64
        } else {
            let g = gate.min(ranges.len() - 2);
            (ranges[g + 1] - ranges[g]) as f64
        };
        (offset.abs() <= spacing / 2.0).then_some(gate)
    }
}

fn circular_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % 360.0;
    d.min(360.0 - d)
}

/// Lower median of the positive gaps between sorted azimuths, wrapping at 360.
fn typical_ray_spacing(sorted: &[RayEntry]) -> f64 {
    if sorted.len() < 2 {
        return DEFAULT_RAY_WIDTH_DEG;
    }
    let mut gaps: Vec<f64> = sorted
        .windows(2)
        .map(|w| w[1].azimuth - w[0].azimuth)
        .chain(std::iter::once(
            sorted[0].azimuth + 360.0 - sorted[sorted.len() - 1].azimuth,
        ))
        .filter(|g| *g > 1e-9)
        .collect();
    if gaps.is_empty() {
        return DEFAULT_RAY_WIDTH_DEG;
    }
    gaps.sort_by(f64::total_cmp);
    gaps[(gaps.len() - 1) / 2]
}
