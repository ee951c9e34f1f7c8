//! Universe roots: the movable origins of engine space
//!
//! Every anchored object's engine transform is defined relative to exactly
//! one universe root as `engine = root⁻¹ ∘ cartesian`. Moving the root
//! ("rebasing") renumbers all engine transforms under it without moving
//! anything in cartesian or geographic space, which is what keeps the
//! single-precision side numerically small.

use crate::core::transform::{CartesianPose, EngineTransform};
use glam::{DQuat, DVec3};
use std::time::Instant;
use tracing::info;

/// Non-owning handle into a [`RootRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootId(u32);

impl RootId {
    /// The registry slot this handle names
    pub fn index(self) -> u32 {
        self.0
    }

    /// Rebuild a handle from a persisted slot index
    pub fn from_index(index: u32) -> Self {
        Self(index)
    }
}

/// A movable origin: offset and orientation of engine space within cartesian
/// space
///
/// The rotation is never set directly; it is derived as the tangent frame at
/// the root's position so that "up" stays consistent on a curved reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniverseRoot {
    universe_position: DVec3,
    universe_rotation: DQuat,
    revision: u64,
}

impl Default for UniverseRoot {
    fn default() -> Self {
        Self {
            universe_position: DVec3::ZERO,
            universe_rotation: DQuat::IDENTITY,
            revision: 0,
        }
    }
}

impl UniverseRoot {
    /// Cartesian position of the engine-space origin
    pub fn universe_position(&self) -> DVec3 {
        self.universe_position
    }

    /// Cartesian orientation of the engine-space axes
    pub fn universe_rotation(&self) -> DQuat {
        self.universe_rotation
    }

    /// Monotonic counter bumped on every move; anchors compare it against
    /// their cached value to detect a root change by value
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Express a cartesian pose in engine space under this root
    pub fn to_engine(&self, pose: &CartesianPose) -> EngineTransform {
        let inverse = self.universe_rotation.inverse();
        let local_position = inverse * (pose.position - self.universe_position);
        let local_rotation = (inverse * pose.rotation).normalize();

        EngineTransform::new(local_position.as_vec3(), local_rotation.as_quat())
    }

    /// Recover the cartesian pose of an engine transform under this root
    pub fn to_cartesian(&self, transform: &EngineTransform) -> CartesianPose {
        CartesianPose::new(
            self.universe_position + self.universe_rotation * transform.position.as_dvec3(),
            (self.universe_rotation * transform.rotation.as_dquat()).normalize(),
        )
    }

    pub(crate) fn set(&mut self, position: DVec3, rotation: DQuat) {
        self.universe_position = position;
        self.universe_rotation = rotation;
        self.revision += 1;
    }
}

/// Record of one root move, kept for diagnostics
#[derive(Debug, Clone, Copy)]
pub struct RebaseRecord {
    /// Which root moved
    pub root: RootId,
    /// When the move happened
    pub timestamp: Instant,
    /// Cartesian position before the move
    pub old_position: DVec3,
    /// Cartesian position after the move
    pub new_position: DVec3,
}

/// Statistics over a registry's lifetime
#[derive(Debug, Clone, Copy)]
pub struct RootStats {
    /// Number of roots in the registry
    pub roots: usize,
    /// Total root moves performed
    pub rebases_performed: usize,
    /// Records currently retained
    pub history_len: usize,
}

/// Owns every universe root of one world
///
/// Anchors hold [`RootId`] handles only; the registry (via the world that
/// owns it) is the single writer of root state.
#[derive(Debug)]
pub struct RootRegistry {
    roots: Vec<UniverseRoot>,
    history: Vec<RebaseRecord>,
    max_history: usize,
    total_rebases: usize,
}

impl RootRegistry {
    /// Create an empty registry keeping at most `max_history` audit records
    pub fn new(max_history: usize) -> Self {
        Self {
            roots: Vec::new(),
            history: Vec::new(),
            max_history,
            total_rebases: 0,
        }
    }

    /// Add a root at the cartesian origin with identity orientation
    pub fn create(&mut self) -> RootId {
        let id = RootId(self.roots.len() as u32);
        self.roots.push(UniverseRoot::default());
        id
    }

    /// Look up a root by handle
    pub fn get(&self, id: RootId) -> Option<&UniverseRoot> {
        self.roots.get(id.0 as usize)
    }

    /// Number of roots
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether the registry has no roots
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Recent root moves, oldest first
    pub fn history(&self) -> &[RebaseRecord] {
        &self.history
    }

    /// Lifetime statistics
    pub fn stats(&self) -> RootStats {
        RootStats {
            roots: self.roots.len(),
            rebases_performed: self.total_rebases,
            history_len: self.history.len(),
        }
    }

    /// Move a root and record the move; returns the new revision
    pub(crate) fn set(&mut self, id: RootId, position: DVec3, rotation: DQuat) -> u64 {
        let root = self
            .roots
            .get_mut(id.0 as usize)
            .unwrap_or_else(|| panic!("universe root {id:?} does not exist"));

        let old_position = root.universe_position;
        root.set(position, rotation);

        self.history.push(RebaseRecord {
            root: id,
            timestamp: Instant::now(),
            old_position,
            new_position: position,
        });
        self.total_rebases += 1;

        // Bound memory growth
        if self.history.len() > self.max_history {
            let drop = self.history.len() / 2;
            self.history.drain(..drop);
        }

        info!(
            root = ?id,
            offset = ?(position - old_position),
            "universe root moved"
        );

        self.roots[id.0 as usize].revision
    }
}
