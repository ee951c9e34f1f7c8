//! Geographic value types
//!
//! These are the authoritative, durable coordinates of the system. They are
//! immutable value types: a change replaces the whole value, never a single
//! field in place.

use crate::spatial::SpatialReferenceId;
use serde::{Deserialize, Serialize};

/// A position expressed in a named spatial reference
///
/// For geographic references `x` is longitude in degrees, `y` is latitude in
/// degrees and `z` is altitude in meters; for projected references all three
/// are planar meters. Non-finite coordinates are representable on purpose:
/// they are how interactive edits look before they are corrected, and the
/// synchronizer knows to contain them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeographicPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// The coordinate system this position is expressed in
    pub spatial_reference: SpatialReferenceId,
}

impl GeographicPosition {
    /// Create a new position
    pub fn new(x: f64, y: f64, z: f64, spatial_reference: SpatialReferenceId) -> Self {
        Self {
            x,
            y,
            z,
            spatial_reference,
        }
    }

    /// A position with no meaningful coordinates yet, used for objects that
    /// are placed by their engine transform and pulled on first sync
    pub fn unplaced(spatial_reference: SpatialReferenceId) -> Self {
        Self::new(f64::NAN, f64::NAN, f64::NAN, spatial_reference)
    }

    /// Whether all three coordinates are finite
    ///
    /// Finiteness is necessary but not sufficient for validity; the reference
    /// must also resolve.
    pub fn has_finite_coordinates(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// An orientation relative to the geographic frame at some position
///
/// Heading is degrees clockwise from north about the up axis, pitch rotates
/// about east, roll about north. A rotation is only meaningful together with
/// the position whose tangent frame it is expressed in.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct GeographicRotation {
    pub heading: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl GeographicRotation {
    /// Create a new rotation from heading/pitch/roll degrees
    pub fn new(heading: f64, pitch: f64, roll: f64) -> Self {
        Self {
            heading,
            pitch,
            roll,
        }
    }

    /// Whether all angles are finite
    pub fn is_finite(&self) -> bool {
        self.heading.is_finite() && self.pitch.is_finite() && self.roll.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_coordinate_check() {
        let good = GeographicPosition::new(-117.0, 34.0, 300.0, SpatialReferenceId::WGS84);
        assert!(good.has_finite_coordinates());

        let bad = GeographicPosition::new(f64::NAN, 34.0, 300.0, SpatialReferenceId::WGS84);
        assert!(!bad.has_finite_coordinates());

        let unplaced = GeographicPosition::unplaced(SpatialReferenceId::WGS84);
        assert!(!unplaced.has_finite_coordinates());
    }

    #[test]
    fn test_position_serialization_round_trip() {
        let position = GeographicPosition::new(-117.1825, 34.0556, 300.0, SpatialReferenceId::WGS84);
        let json = serde_json::to_string(&position).unwrap();
        let back: GeographicPosition = serde_json::from_str(&json).unwrap();
        assert_eq!(position, back);
    }

    #[test]
    fn test_rotation_default_is_identity() {
        let rotation = GeographicRotation::default();
        assert_eq!(rotation, GeographicRotation::new(0.0, 0.0, 0.0));
        assert!(rotation.is_finite());
    }
}
