//! Flat tangent-plane projection for local map scenes
//!
//! Equirectangular mapping with the easting scale taken at the point's own
//! latitude. The inverse decodes latitude from the northing first and then
//! longitude from the easting at that latitude, which makes the round trip
//! exact. The easting scale collapses toward the poles; non-finite inputs
//! propagate through unchanged as the projector's out-of-support signal.

use crate::spatial::Ellipsoid;
use glam::DVec3;

/// Geographic degrees/meters to tangent-plane meters (east, north, up)
pub(crate) fn geographic_to_plane(lon_deg: f64, lat_deg: f64, alt_m: f64, e: &Ellipsoid) -> DVec3 {
    let lat_rad = lat_deg.to_radians();
    let east = lon_deg.to_radians() * e.semi_major_axis * lat_rad.cos();
    let north = lat_rad * e.semi_major_axis;

    DVec3::new(east, north, alt_m)
}

/// Tangent-plane meters back to geographic degrees/meters
pub(crate) fn plane_to_geographic(plane: DVec3, e: &Ellipsoid) -> (f64, f64, f64) {
    let lat_rad = plane.y / e.semi_major_axis;
    let lon_rad = plane.x / (e.semi_major_axis * lat_rad.cos());

    (lon_rad.to_degrees(), lat_rad.to_degrees(), plane.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn test_origin_maps_to_origin() {
        let plane = geographic_to_plane(0.0, 0.0, 0.0, &Ellipsoid::WGS84);
        assert_eq!(plane, DVec3::ZERO);
    }

    #[test]
    fn test_round_trip_mid_latitude() {
        let plane = geographic_to_plane(-117.1825, 34.0556, 300.0, &Ellipsoid::WGS84);
        let (lon, lat, alt) = plane_to_geographic(plane, &Ellipsoid::WGS84);

        assert_close(lon, -117.1825, 1e-9);
        assert_close(lat, 34.0556, 1e-9);
        assert_close(alt, 300.0, 1e-9);
    }

    #[test]
    fn test_one_degree_of_latitude_is_about_111km() {
        let plane = geographic_to_plane(0.0, 1.0, 0.0, &Ellipsoid::WGS84);
        assert_close(plane.y, 111_319.49, 1.0);
    }

    #[test]
    fn test_easting_shrinks_with_latitude() {
        let equator = geographic_to_plane(1.0, 0.0, 0.0, &Ellipsoid::WGS84);
        let high = geographic_to_plane(1.0, 60.0, 0.0, &Ellipsoid::WGS84);

        assert_close(high.x, equator.x * 0.5, 1.0);
    }

    #[test]
    fn test_non_finite_input_propagates() {
        let plane = geographic_to_plane(f64::NAN, 34.0, 0.0, &Ellipsoid::WGS84);
        assert!(!plane.is_finite());
    }
}
