//! Per-object synchronization between geographic and engine state
//!
//! Each anchored object carries an authoritative geographic pose and a cached
//! cartesian/engine mirror of it. Synchronization runs once per tick (and on
//! demand) and reconciles the two in one of three ways:
//!
//! - push: an explicit geographic write is projected down into the engine
//!   transform;
//! - re-apply: the universe root moved, so the engine transform is re-derived
//!   from the cached cartesian pose with geographic state untouched, which
//!   is what makes geographic positions invariant across a rebase;
//! - pull: the engine transform drifted externally (dragging, camera motion),
//!   so the geographic pose is re-derived from it.

use crate::config::GeoWorldConfig;
use crate::core::geo::{GeographicPosition, GeographicRotation};
use crate::core::root::{RootId, UniverseRoot};
use crate::core::transform::{CartesianPose, EngineTransform};
use crate::host::{ObjectId, SceneHost};
use crate::projection::{self, MapType};
use crate::spatial::{Resolution, SpatialReference, SpatialReferenceId, SpatialReferenceResolver};
use tracing::{trace, warn};

/// Synchronization state of an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Geographic and engine state agree
    Clean,
    /// A geographic write is pending propagation to the engine transform
    DirtyPush,
}

/// The per-object location/rotation synchronizer state
///
/// Holds a non-owning [`RootId`]; the world that owns both sides resolves it
/// each tick.
#[derive(Debug, Clone)]
pub struct GeoAnchor {
    object: ObjectId,
    root: RootId,
    geographic_position: GeographicPosition,
    geographic_rotation: GeographicRotation,
    cartesian: CartesianPose,
    cached_engine: EngineTransform,
    cached_revision: u64,
    state: SyncState,
    rebase_source: bool,
    has_synced: bool,
    moved_this_tick: bool,
    root_changed_this_tick: bool,
}

impl GeoAnchor {
    /// Create an anchor whose placement comes from geographic state
    ///
    /// The first synchronization pushes the position into the engine
    /// transform.
    pub(crate) fn from_geographic(
        object: ObjectId,
        root: RootId,
        position: GeographicPosition,
        rotation: GeographicRotation,
    ) -> Self {
        Self {
            object,
            root,
            geographic_position: position,
            geographic_rotation: rotation,
            cartesian: CartesianPose::IDENTITY,
            cached_engine: EngineTransform::IDENTITY,
            cached_revision: 0,
            state: SyncState::DirtyPush,
            rebase_source: false,
            has_synced: false,
            moved_this_tick: false,
            root_changed_this_tick: false,
        }
    }

    /// Create an anchor whose placement comes from the engine transform
    ///
    /// The first synchronization pulls geographic state from wherever the
    /// host currently has the object.
    pub(crate) fn from_engine(
        object: ObjectId,
        root: RootId,
        spatial_reference: SpatialReferenceId,
    ) -> Self {
        Self {
            state: SyncState::Clean,
            ..Self::from_geographic(
                object,
                root,
                GeographicPosition::unplaced(spatial_reference),
                GeographicRotation::default(),
            )
        }
    }

    /// The host object this anchor positions
    pub fn object(&self) -> ObjectId {
        self.object
    }

    /// The universe root this anchor is bound to
    pub fn root(&self) -> RootId {
        self.root
    }

    /// Current synchronization state
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Authoritative geographic position
    pub fn geographic_position(&self) -> GeographicPosition {
        self.geographic_position
    }

    /// Authoritative geographic rotation
    pub fn geographic_rotation(&self) -> GeographicRotation {
        self.geographic_rotation
    }

    /// Cached cartesian pose as of the last synchronization
    pub fn cartesian_pose(&self) -> CartesianPose {
        self.cartesian
    }

    /// Engine transform as of the last synchronization
    pub fn cached_engine(&self) -> EngineTransform {
        self.cached_engine
    }

    /// Whether this anchor may promote its position to the universe root
    pub fn is_rebase_source(&self) -> bool {
        self.rebase_source
    }

    pub(crate) fn set_rebase_source(&mut self, enabled: bool) {
        self.rebase_source = enabled;
    }

    /// Whether at least one synchronization has completed
    pub fn has_synced(&self) -> bool {
        self.has_synced
    }

    pub(crate) fn moved_this_tick(&self) -> bool {
        self.moved_this_tick
    }

    pub(crate) fn root_changed_this_tick(&self) -> bool {
        self.root_changed_this_tick
    }

    pub(crate) fn cached_revision(&self) -> u64 {
        self.cached_revision
    }

    /// Replace the geographic position; repeated writes before a sync
    /// collapse to the latest value
    pub(crate) fn set_geographic_position(&mut self, position: GeographicPosition) {
        self.geographic_position = position;
        self.state = SyncState::DirtyPush;
    }

    /// Replace the geographic rotation; repeated writes before a sync
    /// collapse to the latest value
    pub(crate) fn set_geographic_rotation(&mut self, rotation: GeographicRotation) {
        self.geographic_rotation = rotation;
        self.state = SyncState::DirtyPush;
    }

    /// Bind to a different root and force a full re-derivation
    pub(crate) fn rebind(&mut self, new_root: RootId) {
        self.root = new_root;
        self.state = SyncState::DirtyPush;
    }

    /// Force the next synchronization to re-project geographic state, used
    /// when the projection itself changed meaning
    pub(crate) fn force_push(&mut self) {
        self.state = SyncState::DirtyPush;
    }

    /// One synchronization pass
    ///
    /// Deferred entirely while the spatial reference is unresolved; otherwise
    /// ends in `Clean` and is idempotent until state changes again.
    pub(crate) fn synchronize(
        &mut self,
        root: &UniverseRoot,
        map_type: MapType,
        config: &GeoWorldConfig,
        resolver: &dyn SpatialReferenceResolver,
        host: &mut dyn SceneHost,
    ) {
        self.moved_this_tick = false;
        self.root_changed_this_tick = false;

        let reference = match resolver.resolve(self.geographic_position.spatial_reference) {
            Resolution::Resolved(reference) => reference,
            Resolution::Unresolved => {
                trace!(object = ?self.object, "spatial reference unresolved, sync deferred");
                return;
            }
        };

        match self.state {
            SyncState::DirtyPush => self.push(root, &reference, map_type, host),
            SyncState::Clean => {
                if !self.has_synced {
                    let engine = self.read_host(host);
                    self.pull(engine, root, &reference, map_type);
                } else if self.cached_revision != root.revision() {
                    self.reapply(root, host);
                } else {
                    let engine = self.read_host(host);
                    if transforms_differ(&engine, &self.cached_engine, config) {
                        self.pull(engine, root, &reference, map_type);
                        self.moved_this_tick = true;
                    }
                }
            }
        }
    }

    /// Re-derive the engine transform from the cached cartesian pose after a
    /// root change; geographic state is left untouched
    pub(crate) fn reapply(&mut self, root: &UniverseRoot, host: &mut dyn SceneHost) {
        let engine = root.to_engine(&self.cartesian);
        host.set_local_transform(self.object, engine);
        self.cached_engine = engine;
        self.cached_revision = root.revision();
        self.root_changed_this_tick = true;
    }

    fn push(
        &mut self,
        root: &UniverseRoot,
        reference: &SpatialReference,
        map_type: MapType,
        host: &mut dyn SceneHost,
    ) {
        let position = projection::to_cartesian(&self.geographic_position, reference, map_type);
        let rotation = projection::to_cartesian_rotation(
            position,
            &self.geographic_rotation,
            reference,
            map_type,
        );

        if position.is_finite() && rotation.is_finite() {
            let pose = CartesianPose::new(position, rotation);
            let engine = root.to_engine(&pose);
            host.set_local_transform(self.object, engine);

            self.cartesian = pose;
            self.cached_engine = engine;
            self.cached_revision = root.revision();
            self.has_synced = true;
            self.moved_this_tick = true;
        } else {
            // The write never reaches the engine transform; visually the
            // object snaps back to its last good placement within this tick.
            warn!(
                object = ?self.object,
                position = ?self.geographic_position,
                "geographic input projects to a non-finite pose, resyncing from engine state"
            );
            let engine = self.read_host(host);
            self.pull(engine, root, reference, map_type);
        }

        self.state = SyncState::Clean;
    }

    fn pull(
        &mut self,
        engine: EngineTransform,
        root: &UniverseRoot,
        reference: &SpatialReference,
        map_type: MapType,
    ) {
        let pose = root.to_cartesian(&engine);
        self.geographic_position = projection::to_geographic(
            pose.position,
            reference,
            map_type,
            self.geographic_position.spatial_reference,
        );
        self.geographic_rotation =
            projection::from_cartesian_rotation(pose.position, pose.rotation, reference, map_type);

        self.cartesian = pose;
        self.cached_engine = engine;
        self.cached_revision = root.revision();
        self.has_synced = true;
        self.state = SyncState::Clean;
    }

    fn read_host(&self, host: &dyn SceneHost) -> EngineTransform {
        host.local_transform(self.object).unwrap_or_else(|| {
            panic!(
                "anchored object {:?} is missing from the scene host",
                self.object
            )
        })
    }
}

/// Value comparison with the configured tolerances; never bit-exact
fn transforms_differ(a: &EngineTransform, b: &EngineTransform, config: &GeoWorldConfig) -> bool {
    let position_delta = (a.position.as_dvec3() - b.position.as_dvec3()).length();
    if position_delta > config.drift_epsilon {
        return true;
    }

    let alignment = a.rotation.as_dquat().dot(b.rotation.as_dquat()).abs();
    1.0 - alignment > config.rotation_epsilon
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::EngineWorld;
    use crate::spatial::{BuiltinResolver, SpatialReferenceId};
    use glam::{Quat, Vec3};

    fn setup() -> (EngineWorld, ObjectId, UniverseRoot, GeoWorldConfig) {
        let mut world = EngineWorld::new();
        let object = world.spawn_object(EngineTransform::IDENTITY);
        (world, object, UniverseRoot::default(), GeoWorldConfig::default())
    }

    fn redlands() -> GeographicPosition {
        GeographicPosition::new(-117.1825, 34.0556, 300.0, SpatialReferenceId::WGS84)
    }

    #[test]
    fn test_push_writes_engine_transform() {
        let (mut world, object, root, config) = setup();
        let mut anchor = GeoAnchor::from_geographic(
            object,
            RootId::from_index(0),
            redlands(),
            GeographicRotation::default(),
        );

        anchor.synchronize(&root, MapType::Local, &config, &BuiltinResolver, &mut world);

        assert_eq!(anchor.state(), SyncState::Clean);
        assert!(anchor.has_synced());
        let engine = world.local_transform(object).unwrap();
        assert!(engine.position.is_finite());
        assert_ne!(engine.position, Vec3::ZERO);
    }

    #[test]
    fn test_unresolved_reference_defers_everything() {
        let (mut world, object, root, config) = setup();
        let before = world.local_transform(object).unwrap();
        let mut anchor = GeoAnchor::from_geographic(
            object,
            RootId::from_index(0),
            GeographicPosition::new(1.0, 2.0, 3.0, SpatialReferenceId(999_999)),
            GeographicRotation::default(),
        );

        for _ in 0..5 {
            anchor.synchronize(&root, MapType::Local, &config, &BuiltinResolver, &mut world);
        }

        assert_eq!(anchor.state(), SyncState::DirtyPush);
        assert!(!anchor.has_synced());
        assert_eq!(world.local_transform(object).unwrap(), before);
    }

    #[test]
    fn test_invalid_write_falls_back_to_pull() {
        let (mut world, object, root, config) = setup();
        let placed = EngineTransform::from_position(Vec3::new(100.0, 50.0, 10.0));
        world.set_local_transform(object, placed);

        let mut anchor = GeoAnchor::from_geographic(
            object,
            RootId::from_index(0),
            GeographicPosition::new(f64::NAN, 0.0, 0.0, SpatialReferenceId::WGS84),
            GeographicRotation::default(),
        );

        anchor.synchronize(&root, MapType::Local, &config, &BuiltinResolver, &mut world);

        // Engine transform untouched, geographic resynced from it
        assert_eq!(world.local_transform(object).unwrap(), placed);
        assert_eq!(anchor.state(), SyncState::Clean);
        assert!(anchor.geographic_position().has_finite_coordinates());
    }

    #[test]
    fn test_synchronize_is_idempotent() {
        let (mut world, object, root, config) = setup();
        let mut anchor = GeoAnchor::from_geographic(
            object,
            RootId::from_index(0),
            redlands(),
            GeographicRotation::new(30.0, 0.0, 0.0),
        );

        anchor.synchronize(&root, MapType::Local, &config, &BuiltinResolver, &mut world);
        let first_engine = world.local_transform(object).unwrap();
        let first_geo = anchor.geographic_position();

        anchor.synchronize(&root, MapType::Local, &config, &BuiltinResolver, &mut world);

        assert_eq!(world.local_transform(object).unwrap(), first_engine);
        assert_eq!(anchor.geographic_position(), first_geo);
        assert!(!anchor.moved_this_tick());
    }

    #[test]
    fn test_external_drift_pulls_geographic() {
        let (mut world, object, root, config) = setup();
        let mut anchor = GeoAnchor::from_geographic(
            object,
            RootId::from_index(0),
            redlands(),
            GeographicRotation::default(),
        );
        anchor.synchronize(&root, MapType::Local, &config, &BuiltinResolver, &mut world);
        let before = anchor.geographic_position();

        // Someone drags the object 1km north in engine space
        let mut engine = world.local_transform(object).unwrap();
        engine.position += Vec3::new(0.0, 1000.0, 0.0);
        world.set_local_transform(object, engine);

        anchor.synchronize(&root, MapType::Local, &config, &BuiltinResolver, &mut world);

        let after = anchor.geographic_position();
        assert!(anchor.moved_this_tick());
        assert!(after.y > before.y);
        assert!((after.y - before.y - 1000.0 / 111_319.49).abs() < 1e-4);
    }

    #[test]
    fn test_pull_first_anchor_derives_geographic_from_engine() {
        let (mut world, object, root, config) = setup();
        world.set_local_transform(
            object,
            EngineTransform::from_position(Vec3::new(111_319.49, 0.0, 25.0)),
        );

        let mut anchor =
            GeoAnchor::from_engine(object, RootId::from_index(0), SpatialReferenceId::WGS84);
        anchor.synchronize(&root, MapType::Local, &config, &BuiltinResolver, &mut world);

        let geo = anchor.geographic_position();
        assert!((geo.x - 1.0).abs() < 1e-4);
        assert!(geo.y.abs() < 1e-9);
        assert!((geo.z - 25.0).abs() < 1e-3);
    }

    #[test]
    fn test_last_write_wins_before_sync() {
        let (mut world, object, root, config) = setup();
        let mut anchor = GeoAnchor::from_geographic(
            object,
            RootId::from_index(0),
            redlands(),
            GeographicRotation::default(),
        );

        anchor.set_geographic_position(GeographicPosition::new(
            10.0,
            10.0,
            0.0,
            SpatialReferenceId::WGS84,
        ));
        anchor.set_geographic_position(GeographicPosition::new(
            20.0,
            20.0,
            0.0,
            SpatialReferenceId::WGS84,
        ));

        anchor.synchronize(&root, MapType::Local, &config, &BuiltinResolver, &mut world);

        assert_eq!(anchor.geographic_position().x, 20.0);
        assert_eq!(anchor.geographic_position().y, 20.0);
    }

    #[test]
    fn test_rotation_drift_below_epsilon_is_ignored() {
        let (mut world, object, root, config) = setup();
        let mut anchor = GeoAnchor::from_geographic(
            object,
            RootId::from_index(0),
            redlands(),
            GeographicRotation::default(),
        );
        anchor.synchronize(&root, MapType::Local, &config, &BuiltinResolver, &mut world);

        // Rewrite the identical transform; value comparison must not see drift
        let engine = world.local_transform(object).unwrap();
        world.set_local_transform(object, engine);
        anchor.synchronize(&root, MapType::Local, &config, &BuiltinResolver, &mut world);

        assert!(!anchor.moved_this_tick());
    }

    #[test]
    fn test_transforms_differ_uses_epsilons() {
        let config = GeoWorldConfig::default();
        let a = EngineTransform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let b = EngineTransform::from_position(Vec3::new(1.0, 2.0, 3.0));
        assert!(!transforms_differ(&a, &b, &config));

        let c = EngineTransform::from_position(Vec3::new(1.0, 2.0, 3.5));
        assert!(transforms_differ(&a, &c, &config));

        let d = EngineTransform::new(a.position, Quat::from_rotation_y(0.01));
        assert!(transforms_differ(&a, &d, &config));
    }
}
