//! Scene/object host boundary
//!
//! The host is the external transform graph (a game engine's scene) that
//! actually stores per-object local transforms. It is single-precision and
//! therefore lossy at large magnitudes, which is the reason the universe-root
//! indirection exists at all. The crate talks to it only through the
//! [`SceneHost`] trait; [`EngineWorld`] is a self-contained reference host
//! for embedders without an engine and for the test suite.

use crate::core::transform::EngineTransform;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Opaque handle identifying an object in the scene host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// The external transform graph the synchronizer reads and writes
pub trait SceneHost {
    /// Current local transform of an object, `None` if the object is gone
    fn local_transform(&self, object: ObjectId) -> Option<EngineTransform>;

    /// Overwrite an object's local transform
    fn set_local_transform(&mut self, object: ObjectId, transform: EngineTransform);
}

/// Reference host backed by a `hecs` world
///
/// Objects are entities with an [`EngineTransform`] component; the handle is
/// the entity's bit representation, so it stays valid across the trait
/// boundary without holding a borrow.
pub struct EngineWorld {
    inner: hecs::World,
}

impl Default for EngineWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineWorld {
    /// Create a new empty host world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an object with the given local transform
    pub fn spawn_object(&mut self, transform: EngineTransform) -> ObjectId {
        let entity = self.inner.spawn((transform,));
        let object = ObjectId(entity.to_bits().get());
        debug!(?object, "spawned host object");
        object
    }

    /// Remove an object and its components
    pub fn despawn(&mut self, object: ObjectId) -> bool {
        match Self::entity(object) {
            Some(entity) => self.inner.despawn(entity).is_ok(),
            None => false,
        }
    }

    /// Whether an object still exists
    pub fn contains(&self, object: ObjectId) -> bool {
        Self::entity(object).is_some_and(|entity| self.inner.contains(entity))
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.inner.len() as usize
    }

    /// Whether the host holds no objects
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Access the inner `hecs` world for advanced operations
    pub fn inner(&self) -> &hecs::World {
        &self.inner
    }

    /// Mutable access to the inner `hecs` world
    pub fn inner_mut(&mut self) -> &mut hecs::World {
        &mut self.inner
    }

    fn entity(object: ObjectId) -> Option<hecs::Entity> {
        hecs::Entity::from_bits(object.0)
    }
}

impl SceneHost for EngineWorld {
    fn local_transform(&self, object: ObjectId) -> Option<EngineTransform> {
        let entity = Self::entity(object)?;
        self.inner
            .get::<&EngineTransform>(entity)
            .ok()
            .map(|transform| *transform)
    }

    fn set_local_transform(&mut self, object: ObjectId, transform: EngineTransform) {
        let Some(entity) = Self::entity(object) else {
            return;
        };
        match self.inner.query_one_mut::<&mut EngineTransform>(entity) {
            Ok(existing) => *existing = transform,
            Err(_) => {
                let _ = self.inner.insert_one(entity, transform);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn test_spawn_and_read_back() {
        let mut world = EngineWorld::new();
        let transform = EngineTransform::from_position(Vec3::new(1.0, 2.0, 3.0));

        let object = world.spawn_object(transform);

        assert!(world.contains(object));
        assert_eq!(world.local_transform(object), Some(transform));
    }

    #[test]
    fn test_set_local_transform_overwrites() {
        let mut world = EngineWorld::new();
        let object = world.spawn_object(EngineTransform::IDENTITY);

        let moved = EngineTransform::new(Vec3::new(5.0, 0.0, 0.0), Quat::from_rotation_z(0.5));
        world.set_local_transform(object, moved);

        assert_eq!(world.local_transform(object), Some(moved));
    }

    #[test]
    fn test_despawned_object_has_no_transform() {
        let mut world = EngineWorld::new();
        let object = world.spawn_object(EngineTransform::IDENTITY);

        assert!(world.despawn(object));
        assert!(!world.contains(object));
        assert_eq!(world.local_transform(object), None);
    }
}
