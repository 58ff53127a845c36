//! Storm-relative velocity.

use radar_common::{RadarError, RadarResult, StormMotion};
use volume::FieldData;

/// Remove the storm motion's radial component from every gate of a velocity
/// field: `corrected = raw - (u·sin(az) + v·cos(az))`.
///
/// Missing gates stay missing. `azimuths` holds one angle per ray.
pub fn storm_relative(
    velocity: &FieldData,
    azimuths: &[f32],
    motion: StormMotion,
) -> RadarResult<FieldData> {
    if azimuths.len() != velocity.rays() {
        return Err(RadarError::InvalidParameter {
            param: "azimuths".to_string(),
            message: format!(
                "{} azimuths for a field with {} rays",
                azimuths.len(),
                velocity.rays()
            ),
        });
    }

    let components: Vec<f32> = azimuths.iter().map(|&az| motion.component(az)).collect();
    Ok(velocity.map_rays(|ray, v| v - components[ray]))
}
