//! Synthetic sweep geometry and field data.
//!
//! Everything here is plain `Vec<f32>` in row-major `[ray, gate]` order so the
//! generators stay independent of the crates under test.

/// Evenly spaced ray azimuths, the first at half a spacing past north.
///
/// ```
/// use test_utils::uniform_azimuths;
///
/// let az = uniform_azimuths(4);
/// assert_eq!(az, vec![45.0, 135.0, 225.0, 315.0]);
/// ```
pub fn uniform_azimuths(rays: usize) -> Vec<f32> {
    let spacing = 360.0 / rays as f32;
    (0..rays).map(|r| spacing * (r as f32 + 0.5)).collect()
}

/// Gate center ranges in meters.
pub fn gate_ranges(first_m: f32, spacing_m: f32, gates: usize) -> Vec<f32> {
    (0..gates).map(|g| first_m + spacing_m * g as f32).collect()
}

/// A single convective cell: peak `peak_dbz` at (`ray`, `gate`), falling off
/// 4 dBZ per gate and 6 dBZ per ray, NaN where it drops below 5 dBZ.
pub fn reflectivity_cell(
    rays: usize,
    gates: usize,
    ray: usize,
    gate: usize,
    peak_dbz: f32,
) -> Vec<f32> {
    let mut data = Vec::with_capacity(rays * gates);
    for r in 0..rays {
        let dr = r.abs_diff(ray).min(rays - r.abs_diff(ray)) as f32;
        for g in 0..gates {
            let dg = g.abs_diff(gate) as f32;
            let value = peak_dbz - 6.0 * dr - 4.0 * dg;
            data.push(if value < 5.0 { f32::NAN } else { value });
        }
    }
    data
}

/// Radial velocity of a uniform wind, `speed` m/s blowing toward `toward_deg`,
/// as seen along each ray of `azimuths`.
pub fn uniform_wind_velocity(azimuths: &[f32], gates: usize, speed: f32, toward_deg: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(azimuths.len() * gates);
    for az in azimuths {
        let radial = speed * (az - toward_deg).to_radians().cos();
        data.extend(std::iter::repeat(radial).take(gates));
    }
    data
}
