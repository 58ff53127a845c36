//! Antenna (range, azimuth, elevation) to local Cartesian offsets.
//!
//! Two beam models are supported:
//! - **4/3 Earth**: standard refraction model; the beam is traced over a
//!   sphere of radius 4/3 of the Earth's, which bends it back toward the
//!   surface. Height and ground distance follow Doviak & Zrnić (2.28).
//! - **Flat**: ground distance `r·cos(el)`, height `r·sin(el)`. Cheaper and
//!   within a few hundred meters of the 4/3 model out to 230 km at low tilts.

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Effective radius used by the 4/3 refraction model.
pub const EFFECTIVE_EARTH_RADIUS_M: f64 = EARTH_RADIUS_M * 4.0 / 3.0;

/// How the beam path is modelled when converting slant range to ground distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BeamModel {
    #[default]
    FourThirdsEarth,
    Flat,
}

/// Offset from the antenna in meters: east, north, up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Enu {
    pub east: f64,
    pub north: f64,
    pub up: f64,
}

impl Enu {
    /// Distance along the surface from the radar.
    pub fn ground_distance(&self) -> f64 {
        self.east.hypot(self.north)
    }

    /// Compass bearing from the radar, degrees in [0, 360).
    pub fn azimuth_deg(&self) -> f64 {
        normalize_azimuth(self.east.atan2(self.north).to_degrees())
    }
}

/// Wrap an angle into [0, 360).
pub fn normalize_azimuth(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Ground distance and beam height for a slant range at an elevation.
pub fn ground_distance_and_height(range_m: f64, elevation_deg: f64, model: BeamModel) -> (f64, f64) {
    let el = elevation_deg.to_radians();
    match model {
        BeamModel::Flat => (range_m * el.cos(), range_m * el.sin()),
        BeamModel::FourThirdsEarth => {
            let r_e = EFFECTIVE_EARTH_RADIUS_M;
            let height =
                (range_m * range_m + r_e * r_e + 2.0 * range_m * r_e * el.sin()).sqrt() - r_e;
            let ground = r_e * ((range_m * el.cos()) / (r_e + height)).asin();
            (ground, height)
        }
    }
}

/// Convert an antenna coordinate to an east/north/up offset from the radar.
pub fn antenna_to_cartesian(
    range_m: f64,
    azimuth_deg: f64,
    elevation_deg: f64,
    model: BeamModel,
) -> Enu {
    let (ground, up) = ground_distance_and_height(range_m, elevation_deg, model);
    let az = azimuth_deg.to_radians();
    Enu {
        east: ground * az.sin(),
        north: ground * az.cos(),
        up,
    }
}

/// Slant range that reaches `ground_m` along the surface at `elevation_deg`.
///
/// Returns `None` when no such range exists (ground distance beyond the
/// beam's horizon, or a vertical beam).
pub fn slant_range_for_ground(ground_m: f64, elevation_deg: f64, model: BeamModel) -> Option<f64> {
    if ground_m <= 0.0 {
        return Some(0.0);
    }
    let el = elevation_deg.to_radians();
    match model {
        BeamModel::Flat => {
            let c = el.cos();
            if c <= f64::EPSILON {
                None
            } else {
                Some(ground_m / c)
            }
        }
        BeamModel::FourThirdsEarth => {
            // r·cos(el) = sin(θ)·sqrt(r² + R² + 2rR·sin(el)), θ = s/R.
            // Squared, this is a quadratic a·r² + b·r + c = 0.
            let r_e = EFFECTIVE_EARTH_RADIUS_M;
            let theta = ground_m / r_e;
            if theta >= std::f64::consts::FRAC_PI_2 {
                return None;
            }
            let s2 = theta.sin().powi(2);
            let a = el.cos().powi(2) - s2;
            let b = -2.0 * r_e * el.sin() * s2;
            let c = -r_e * r_e * s2;
            if a <= 0.0 {
                return None;
            }
            let disc = b * b - 4.0 * a * c;
            if disc < 0.0 {
                return None;
            }
            Some((-b + disc.sqrt()) / (2.0 * a))
        }
    }
}

/// Recover (slant range, azimuth) from a Cartesian offset, given the
/// elevation of the ray that produced it.
pub fn cartesian_to_antenna(
    east: f64,
    north: f64,
    elevation_deg: f64,
    model: BeamModel,
) -> Option<(f64, f64)> {
    let enu = Enu { east, north, up: 0.0 };
    let range = slant_range_for_ground(enu.ground_distance(), elevation_deg, model)?;
    Some((range, enu.azimuth_deg()))
}
