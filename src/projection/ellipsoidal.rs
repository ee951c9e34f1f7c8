//! Ellipsoidal (earth-centered) projection math
//!
//! Geodetic coordinates convert to earth-centered earth-fixed cartesian
//! coordinates through the prime-vertical radius of curvature; the inverse
//! uses Bowring's closed-form approximation, which is exact to well below a
//! millimeter for terrestrial altitudes.

use crate::spatial::Ellipsoid;
use glam::{DMat3, DVec3};

/// Geodetic (radians, meters) to earth-centered cartesian
pub(crate) fn geodetic_to_ecef(lon_rad: f64, lat_rad: f64, alt_m: f64, e: &Ellipsoid) -> DVec3 {
    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lon, cos_lon) = lon_rad.sin_cos();
    let e2 = e.eccentricity_squared();

    // Radius of curvature in the prime vertical
    let n = e.semi_major_axis / (1.0 - e2 * sin_lat * sin_lat).sqrt();

    DVec3::new(
        (n + alt_m) * cos_lat * cos_lon,
        (n + alt_m) * cos_lat * sin_lon,
        (n * (1.0 - e2) + alt_m) * sin_lat,
    )
}

/// Earth-centered cartesian to geodetic (radians, meters)
pub(crate) fn ecef_to_geodetic(ecef: DVec3, e: &Ellipsoid) -> (f64, f64, f64) {
    let a = e.semi_major_axis;
    let b = e.semi_minor_axis();
    let e2 = e.eccentricity_squared();
    let ep2 = e.second_eccentricity_squared();

    let p = (ecef.x * ecef.x + ecef.y * ecef.y).sqrt();
    let lon = ecef.y.atan2(ecef.x);

    let theta = (ecef.z * a).atan2(p * b);
    let (sin_theta, cos_theta) = theta.sin_cos();

    let lat = (ecef.z + ep2 * b * sin_theta * sin_theta * sin_theta)
        .atan2(p - e2 * a * cos_theta * cos_theta * cos_theta);

    let sin_lat = lat.sin();
    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let alt = p / lat.cos() - n;

    (lon, lat, alt)
}

/// East-North-Up basis at a geodetic point, expressed as columns in the
/// earth-centered frame
pub(crate) fn enu_basis(lon_rad: f64, lat_rad: f64) -> DMat3 {
    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lon, cos_lon) = lon_rad.sin_cos();

    DMat3::from_cols(
        DVec3::new(-sin_lon, cos_lon, 0.0),
        DVec3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat),
        DVec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn test_equator_prime_meridian() {
        let ecef = geodetic_to_ecef(0.0, 0.0, 0.0, &Ellipsoid::WGS84);
        assert_close(ecef.x, Ellipsoid::WGS84.semi_major_axis, 1e-6);
        assert_close(ecef.y, 0.0, 1e-6);
        assert_close(ecef.z, 0.0, 1e-6);
    }

    #[test]
    fn test_equator_90_east() {
        let ecef = geodetic_to_ecef(FRAC_PI_2, 0.0, 0.0, &Ellipsoid::WGS84);
        assert_close(ecef.x, 0.0, 1e-6);
        assert_close(ecef.y, Ellipsoid::WGS84.semi_major_axis, 1e-6);
        assert_close(ecef.z, 0.0, 1e-6);
    }

    #[test]
    fn test_round_trip() {
        let lon = -std::f64::consts::FRAC_PI_3;
        let lat = std::f64::consts::FRAC_PI_6;
        let alt = 120.0;

        let ecef = geodetic_to_ecef(lon, lat, alt, &Ellipsoid::WGS84);
        let (lon_rt, lat_rt, alt_rt) = ecef_to_geodetic(ecef, &Ellipsoid::WGS84);

        assert_close(lon_rt, lon, 1e-12);
        assert_close(lat_rt, lat, 1e-12);
        assert_close(alt_rt, alt, 1e-6);
    }

    #[test]
    fn test_enu_basis_is_orthonormal() {
        let basis = enu_basis(0.5, -0.8);

        let east = basis.x_axis;
        let north = basis.y_axis;
        let up = basis.z_axis;

        assert_close(east.length(), 1.0, 1e-12);
        assert_close(north.length(), 1.0, 1e-12);
        assert_close(up.length(), 1.0, 1e-12);
        assert_close(east.dot(north), 0.0, 1e-12);
        assert_close(east.dot(up), 0.0, 1e-12);
        assert_close(north.dot(up), 0.0, 1e-12);
        // Right-handed: east x north = up
        assert_close((east.cross(north) - up).length(), 0.0, 1e-12);
    }

    #[test]
    fn test_up_points_away_from_ellipsoid() {
        let lon = 0.3_f64;
        let lat = 0.7_f64;

        let surface = geodetic_to_ecef(lon, lat, 0.0, &Ellipsoid::WGS84);
        let raised = geodetic_to_ecef(lon, lat, 100.0, &Ellipsoid::WGS84);
        let up = enu_basis(lon, lat).z_axis;

        assert_close(((raised - surface) / 100.0 - up).length(), 0.0, 1e-9);
    }
}
