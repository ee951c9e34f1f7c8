//! Pose types for the two precision domains
//!
//! The engine/host side is single precision and only meaningful near the
//! universe root; the cartesian side is double precision and spans the whole
//! reference frame. Keeping the two apart, with explicit conversion through
//! the root, is the entire point of the system.

use glam::{DMat4, DQuat, DVec3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A single-precision local transform as the scene host stores it
///
/// Lossy at large magnitudes by design; the universe root keeps the values
/// this type carries numerically small.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EngineTransform {
    /// Position relative to the universe root
    pub position: Vec3,
    /// Rotation relative to the universe root frame
    pub rotation: Quat,
}

impl Default for EngineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl EngineTransform {
    /// The identity transform at the root origin
    pub const IDENTITY: EngineTransform = EngineTransform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Create a transform from position and rotation
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Create a transform with the given position and identity rotation
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

/// A double-precision pose in cartesian space
///
/// Always derived, never authoritative and never persisted: it is recomputed
/// from geographic state or pulled from the engine transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianPose {
    /// Position in cartesian space
    pub position: DVec3,
    /// Rotation in cartesian space
    pub rotation: DQuat,
}

impl Default for CartesianPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CartesianPose {
    /// The identity pose at the cartesian origin
    pub const IDENTITY: CartesianPose = CartesianPose {
        position: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    /// Create a pose from position and rotation
    pub fn new(position: DVec3, rotation: DQuat) -> Self {
        Self { position, rotation }
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }

    /// Convert to a 4x4 transformation matrix in double precision
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.rotation, self.position)
    }

    /// Distance to another pose's position
    pub fn distance_to(&self, other: &CartesianPose) -> f64 {
        self.position.distance(other.position)
    }
}
