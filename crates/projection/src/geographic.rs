//! Local Cartesian offsets to latitude/longitude around a radar site.
//!
//! - [`GeoModel::AzimuthalEquidistant`]: exact spherical mapping that keeps
//!   distance and bearing from the radar; the usual choice for radar displays.
//! - [`GeoModel::Equirectangular`]: fixed meters-per-degree, with longitude
//!   scaled by `cos(lat0)`. About 111.2 km per degree of latitude.
//!
//! Both are exactly invertible.

/// Sphere radius used by both models, meters.
pub const GEO_EARTH_RADIUS_M: f64 = 6_370_997.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeoModel {
    #[default]
    AzimuthalEquidistant,
    Equirectangular,
}

/// Meters per degree of latitude on the model sphere.
pub fn meters_per_degree() -> f64 {
    GEO_EARTH_RADIUS_M * std::f64::consts::PI / 180.0
}

/// Wrap a longitude into [-180, 180).
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Convert an east/north offset (meters) from `(lat0, lon0)` to (lat, lon).
pub fn cartesian_to_geographic(
    east: f64,
    north: f64,
    lat0: f64,
    lon0: f64,
    model: GeoModel,
) -> (f64, f64) {
    match model {
        GeoModel::Equirectangular => {
            let m = meters_per_degree();
            let lat = lat0 + north / m;
            let lon = lon0 + east / (m * lat0.to_radians().cos());
            (lat, normalize_longitude(lon))
        }
        GeoModel::AzimuthalEquidistant => {
            let rho = east.hypot(north);
            if rho == 0.0 {
                return (lat0, lon0);
            }
            let lat0_r = lat0.to_radians();
            let c = rho / GEO_EARTH_RADIUS_M;
            let (sin_c, cos_c) = c.sin_cos();
            let lat = (cos_c * lat0_r.sin() + north * sin_c * lat0_r.cos() / rho)
                .clamp(-1.0, 1.0)
                .asin();
            let dlon = (east * sin_c)
                .atan2(rho * lat0_r.cos() * cos_c - north * lat0_r.sin() * sin_c);
            (lat.to_degrees(), normalize_longitude(lon0 + dlon.to_degrees()))
        }
    }
}

/// Convert (lat, lon) to an east/north offset (meters) from `(lat0, lon0)`.
pub fn geographic_to_cartesian(
    lat: f64,
    lon: f64,
    lat0: f64,
    lon0: f64,
    model: GeoModel,
) -> (f64, f64) {
    let dlon_deg = normalize_longitude(lon - lon0);
    match model {
        GeoModel::Equirectangular => {
            let m = meters_per_degree();
            let north = (lat - lat0) * m;
            let east = dlon_deg * m * lat0.to_radians().cos();
            (east, north)
        }
        GeoModel::AzimuthalEquidistant => {
            let lat_r = lat.to_radians();
            let lat0_r = lat0.to_radians();
            let dlon = dlon_deg.to_radians();
            let cos_c = (lat0_r.sin() * lat_r.sin() + lat0_r.cos() * lat_r.cos() * dlon.cos())
                .clamp(-1.0, 1.0);
            let c = cos_c.acos();
            let k = if c.abs() < 1e-12 { 1.0 } else { c / c.sin() };
            let east = GEO_EARTH_RADIUS_M * k * lat_r.cos() * dlon.sin();
            let north = GEO_EARTH_RADIUS_M
                * k
                * (lat0_r.cos() * lat_r.sin() - lat0_r.sin() * lat_r.cos() * dlon.cos());
            (east, north)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    const KFFC: (f64, f64) = (33.3636, -84.5658);

    #[test]
    fn test_origin_maps_to_station() {
        for model in [GeoModel::AzimuthalEquidistant, GeoModel::Equirectangular] {
            let (lat, lon) = cartesian_to_geographic(0.0, 0.0, KFFC.0, KFFC.1, model);
            assert_approx_eq!(lat, KFFC.0, 1e-12);
            assert_approx_eq!(lon, KFFC.1, 1e-12);
        }
    }

    #[test]
    fn test_one_degree_north_is_about_111_km() {
        let (lat, lon) =
            cartesian_to_geographic(0.0, 111_195.0, KFFC.0, KFFC.1, GeoModel::AzimuthalEquidistant);
        assert_approx_eq!(lat - KFFC.0, 1.0, 1e-3);
        assert_approx_eq!(lon, KFFC.1, 1e-9);
    }

    #[test]
    fn test_east_offset_scales_with_latitude() {
        let (_, lon) =
            cartesian_to_geographic(100_000.0, 0.0, KFFC.0, KFFC.1, GeoModel::Equirectangular);
        let expected = 100_000.0 / (meters_per_degree() * KFFC.0.to_radians().cos());
        assert_approx_eq!(lon - KFFC.1, expected, 1e-9);
    }

    #[test]
    fn test_roundtrip_both_models() {
        for model in [GeoModel::AzimuthalEquidistant, GeoModel::Equirectangular] {
            for &(e, n) in &[
                (1_000.0, 2_000.0),
                (-150_000.0, 80_000.0),
                (230_000.0, -230_000.0),
                (-5.0, -460_000.0),
            ] {
                let (lat, lon) = cartesian_to_geographic(e, n, KFFC.0, KFFC.1, model);
                let (e2, n2) = geographic_to_cartesian(lat, lon, KFFC.0, KFFC.1, model);
                assert_approx_eq!(e2, e, 1e-4);
                assert_approx_eq!(n2, n, 1e-4);
            }
        }
    }

    #[test]
    fn test_longitude_wraps() {
        assert_approx_eq!(normalize_longitude(190.0), -170.0, 1e-12);
        assert_approx_eq!(normalize_longitude(-181.0), 179.0, 1e-12);
        let (_, lon) =
            cartesian_to_geographic(50_000.0, 0.0, 0.0, 179.9, GeoModel::AzimuthalEquidistant);
        assert!(lon < -179.0);
    }
}
