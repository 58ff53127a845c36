//! Colour ramps for radar products.
//!
//! A ramp is an ordered list of colours spread evenly over a product's
//! `[vmin, vmax]` range. Values are mapped with a clamped linear scale:
//! at or below `vmin` gives the first colour, at or above `vmax` the last,
//! and anything between is interpolated between the two neighbouring stops.

use radar_common::ColorRampId;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;
    let mix = |a: u8, b: u8| (a as f32 * t_inv + b as f32 * t).round() as u8;

    Color::new(
        mix(color1.r, color2.r),
        mix(color1.g, color2.g),
        mix(color1.b, color2.b),
        mix(color1.a, color2.a),
    )
}

const NWS_REFLECTIVITY: &[Color] = &[
    Color::rgb(0, 236, 236),
    Color::rgb(1, 160, 246),
    Color::rgb(0, 0, 246),
    Color::rgb(0, 255, 0),
    Color::rgb(0, 200, 0),
    Color::rgb(0, 144, 0),
    Color::rgb(255, 255, 0),
    Color::rgb(231, 192, 0),
    Color::rgb(255, 144, 0),
    Color::rgb(255, 0, 0),
    Color::rgb(214, 0, 0),
    Color::rgb(192, 0, 0),
    Color::rgb(255, 0, 255),
    Color::rgb(153, 85, 201),
    Color::rgb(255, 255, 255),
];

// Inbound (negative) greens through gray to outbound reds
const NWS_VELOCITY: &[Color] = &[
    Color::rgb(2, 252, 2),
    Color::rgb(1, 228, 1),
    Color::rgb(1, 197, 1),
    Color::rgb(7, 172, 4),
    Color::rgb(6, 143, 3),
    Color::rgb(4, 114, 2),
    Color::rgb(124, 151, 123),
    Color::rgb(152, 119, 119),
    Color::rgb(137, 0, 0),
    Color::rgb(162, 0, 0),
    Color::rgb(185, 0, 0),
    Color::rgb(216, 0, 0),
    Color::rgb(239, 0, 0),
    Color::rgb(254, 0, 0),
];

const DIFFERENTIAL: &[Color] = &[
    Color::rgb(64, 64, 64),
    Color::rgb(100, 100, 200),
    Color::rgb(0, 180, 255),
    Color::rgb(0, 220, 120),
    Color::rgb(255, 255, 0),
    Color::rgb(255, 140, 0),
    Color::rgb(220, 0, 0),
    Color::rgb(255, 0, 200),
];

/// A ramp of evenly spaced colour stops over `[vmin, vmax]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    stops: Vec<Color>,
    vmin: f32,
    vmax: f32,
}

impl ColorRamp {
    /// Build a ramp from explicit stops.
    ///
    /// Returns `None` without stops or with a non-increasing range.
    pub fn new(stops: Vec<Color>, vmin: f32, vmax: f32) -> Option<Self> {
        if stops.is_empty() || !(vmax > vmin) || !vmin.is_finite() || !vmax.is_finite() {
            return None;
        }
        Some(Self { stops, vmin, vmax })
    }

    /// The built-in ramp for a product.
    pub fn for_ramp(id: ColorRampId, vmin: f32, vmax: f32) -> Option<Self> {
        let stops = match id {
            ColorRampId::NwsReflectivity => NWS_REFLECTIVITY,
            ColorRampId::NwsVelocity => NWS_VELOCITY,
            ColorRampId::Differential => DIFFERENTIAL,
        };
        Self::new(stops.to_vec(), vmin, vmax)
    }

    pub fn range(&self) -> (f32, f32) {
        (self.vmin, self.vmax)
    }

    pub fn stops(&self) -> &[Color] {
        &self.stops
    }

    /// Colour for `value`; transparent for NaN.
    pub fn color_at(&self, value: f32) -> Color {
        if value.is_nan() {
            return Color::transparent();
        }
        let last = self.stops.len() - 1;
        if value <= self.vmin || last == 0 {
            return self.stops[0];
        }
        if value >= self.vmax {
            return self.stops[last];
        }

        let pos = (value - self.vmin) / (self.vmax - self.vmin) * last as f32;
        let lower = (pos.floor() as usize).min(last - 1);
        interpolate_color(self.stops[lower], self.stops[lower + 1], pos - lower as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reflectivity() -> ColorRamp {
        ColorRamp::for_ramp(ColorRampId::NwsReflectivity, -32.0, 64.0).unwrap()
    }

    #[test]
    fn test_clamped_ends() {
        let ramp = reflectivity();
        assert_eq!(ramp.color_at(-32.0), NWS_REFLECTIVITY[0]);
        assert_eq!(ramp.color_at(-100.0), NWS_REFLECTIVITY[0]);
        assert_eq!(ramp.color_at(64.0), NWS_REFLECTIVITY[14]);
        assert_eq!(ramp.color_at(f32::INFINITY), NWS_REFLECTIVITY[14]);
    }

    #[test]
    fn test_stop_positions_are_exact() {
        // 15 stops over 96 dBZ: one stop every 96/14 dBZ
        let ramp = reflectivity();
        let step = 96.0 / 14.0;
        for (i, stop) in NWS_REFLECTIVITY.iter().enumerate().skip(1).take(12) {
            assert_eq!(ramp.color_at(-32.0 + step * i as f32 + 1e-4), *stop, "stop {}", i);
        }
    }

    #[test]
    fn test_midpoint_interpolates() {
        let ramp = ColorRamp::new(vec![Color::rgb(0, 0, 0), Color::rgb(200, 100, 50)], 0.0, 10.0).unwrap();
        assert_eq!(ramp.color_at(5.0), Color::rgb(100, 50, 25));
    }

    #[test]
    fn test_nan_is_transparent() {
        assert!(reflectivity().color_at(f32::NAN).is_transparent());
    }

    #[test]
    fn test_invalid_ramps() {
        assert!(ColorRamp::new(vec![], 0.0, 1.0).is_none());
        assert!(ColorRamp::for_ramp(ColorRampId::NwsVelocity, 5.0, 5.0).is_none());
        assert!(ColorRamp::for_ramp(ColorRampId::Differential, 1.0, f32::NAN).is_none());
    }

    #[test]
    fn test_single_stop_ramp() {
        let ramp = ColorRamp::new(vec![Color::rgb(9, 9, 9)], 0.0, 1.0).unwrap();
        assert_eq!(ramp.color_at(0.5), Color::rgb(9, 9, 9));
    }

    #[test]
    fn test_velocity_ramp_is_green_inbound_red_outbound() {
        let ramp = ColorRamp::for_ramp(ColorRampId::NwsVelocity, -30.0, 30.0).unwrap();
        let inbound = ramp.color_at(-25.0);
        let outbound = ramp.color_at(25.0);
        assert!(inbound.g > inbound.r);
        assert!(outbound.r > outbound.g);
    }
}
