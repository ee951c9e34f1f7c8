//! Geographic ↔ cartesian projection
//!
//! The projector is a pure function layer between the authoritative
//! geographic coordinates and the derived double-precision cartesian space.
//! Two algorithm families exist, selected by [`MapType`]:
//!
//! - `Global`: ellipsoidal earth-centered projection; cartesian space is
//!   ECEF-like, with the tangent frame varying across the surface.
//! - `Local`: flat tangent-plane projection; cartesian space is a plane with
//!   X=east, Y=north, Z=up everywhere.
//!
//! Rotation convention: the local frame at a point is X=East, Y=North, Z=Up.
//! Heading is degrees clockwise from north about Up, pitch rotates about
//! East, roll about North; composition uses the Z-X-Y Euler order.
//!
//! Inputs outside a projection's support yield non-finite components. That
//! is a legitimate "invalid transform" signal, not an error: callers check
//! `is_finite()` before trusting a result, and must check the spatial
//! reference resolves before calling at all.

pub(crate) mod ellipsoidal;
pub(crate) mod tangent;

use crate::core::geo::{GeographicPosition, GeographicRotation};
use crate::spatial::{SpatialReference, SpatialReferenceId};
use glam::{DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

/// Which projection family a map uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapType {
    /// Flat tangent-plane scene
    Local,
    /// Ellipsoidal globe scene
    Global,
}

/// Project a geographic position into cartesian space
pub fn to_cartesian(
    geo: &GeographicPosition,
    reference: &SpatialReference,
    map_type: MapType,
) -> DVec3 {
    match (map_type, reference) {
        (MapType::Global, SpatialReference::Geographic(e)) => {
            ellipsoidal::geodetic_to_ecef(geo.x.to_radians(), geo.y.to_radians(), geo.z, e)
        }
        (MapType::Local, SpatialReference::Geographic(e)) => {
            tangent::geographic_to_plane(geo.x, geo.y, geo.z, e)
        }
        (MapType::Local, SpatialReference::Projected { .. }) => DVec3::new(geo.x, geo.y, geo.z),
        // A planar reference has no ellipsoidal interpretation
        (MapType::Global, SpatialReference::Projected { .. }) => DVec3::NAN,
    }
}

/// Recover a geographic position from cartesian space
pub fn to_geographic(
    cartesian: DVec3,
    reference: &SpatialReference,
    map_type: MapType,
    id: SpatialReferenceId,
) -> GeographicPosition {
    match (map_type, reference) {
        (MapType::Global, SpatialReference::Geographic(e)) => {
            let (lon, lat, alt) = ellipsoidal::ecef_to_geodetic(cartesian, e);
            GeographicPosition::new(lon.to_degrees(), lat.to_degrees(), alt, id)
        }
        (MapType::Local, SpatialReference::Geographic(e)) => {
            let (lon, lat, alt) = tangent::plane_to_geographic(cartesian, e);
            GeographicPosition::new(lon, lat, alt, id)
        }
        (MapType::Local, SpatialReference::Projected { .. }) => {
            GeographicPosition::new(cartesian.x, cartesian.y, cartesian.z, id)
        }
        (MapType::Global, SpatialReference::Projected { .. }) => {
            GeographicPosition::new(f64::NAN, f64::NAN, f64::NAN, id)
        }
    }
}

/// The East-North-Up tangent frame at a cartesian position, as a rotation
/// from the local frame into cartesian space
///
/// For local map types the plane's axes already are east/north/up, so the
/// frame is the identity everywhere. This same frame orients the universe
/// root after a rebase, which is what keeps "up" consistent on the globe.
pub fn tangent_frame(cartesian: DVec3, reference: &SpatialReference, map_type: MapType) -> DQuat {
    match (map_type, reference) {
        (MapType::Global, SpatialReference::Geographic(e)) => {
            if !cartesian.is_finite() {
                return DQuat::NAN;
            }
            let (lon, lat, _) = ellipsoidal::ecef_to_geodetic(cartesian, e);
            DQuat::from_mat3(&ellipsoidal::enu_basis(lon, lat))
        }
        (MapType::Global, SpatialReference::Projected { .. }) => DQuat::NAN,
        (MapType::Local, _) => DQuat::IDENTITY,
    }
}

/// Convert a geographic rotation at a cartesian position into a cartesian
/// quaternion
pub fn to_cartesian_rotation(
    cartesian: DVec3,
    rotation: &GeographicRotation,
    reference: &SpatialReference,
    map_type: MapType,
) -> DQuat {
    if !rotation.is_finite() {
        return DQuat::NAN;
    }
    let frame = tangent_frame(cartesian, reference, map_type);
    if !frame.is_finite() {
        return DQuat::NAN;
    }

    let local = DQuat::from_euler(
        EulerRot::ZXY,
        -rotation.heading.to_radians(),
        rotation.pitch.to_radians(),
        rotation.roll.to_radians(),
    );

    (frame * local).normalize()
}

/// Recover a geographic rotation from a cartesian quaternion at a position
///
/// Heading is normalized into `[0, 360)`.
pub fn from_cartesian_rotation(
    cartesian: DVec3,
    rotation: DQuat,
    reference: &SpatialReference,
    map_type: MapType,
) -> GeographicRotation {
    let frame = tangent_frame(cartesian, reference, map_type);
    if !frame.is_finite() || !rotation.is_finite() {
        return GeographicRotation::new(f64::NAN, f64::NAN, f64::NAN);
    }

    let local = (frame.inverse() * rotation).normalize();
    let (yaw, pitch, roll) = local.to_euler(EulerRot::ZXY);

    GeographicRotation::new(
        (-yaw.to_degrees()).rem_euclid(360.0),
        pitch.to_degrees(),
        roll.to_degrees(),
    )
}
