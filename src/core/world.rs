//! World orchestration: the tick loop and change propagation
//!
//! `GeoWorld` owns the durable and derived state of one map (configuration,
//! map type, spatial reference, universe roots and anchors) and drives it
//! once per tick. The scene host and the spatial-reference
//! resolver are external collaborators passed into every operation that
//! needs them; nothing in here is a global.
//!
//! The model is single-threaded and cooperative: one `tick` is one atomic
//! batch. A root promotion inside a tick is followed by a closing
//! synchronization pass, so no anchor ever observes a half-applied root.

use crate::config::GeoWorldConfig;
use crate::core::anchor::{GeoAnchor, SyncState};
use crate::core::geo::{GeographicPosition, GeographicRotation};
use crate::core::rebase::{self, PromotionReason};
use crate::core::root::{RootId, RootRegistry, RootStats, UniverseRoot};
use crate::core::transform::CartesianPose;
use crate::host::{ObjectId, SceneHost};
use crate::projection::{self, MapType};
use crate::spatial::{Resolution, SpatialReferenceId, SpatialReferenceResolver};
use glam::DVec3;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// The coordinate synchronization world for one map
pub struct GeoWorld {
    config: GeoWorldConfig,
    map_type: MapType,
    spatial_reference: SpatialReferenceId,
    projection_revision: u64,
    roots: RootRegistry,
    anchors: HashMap<ObjectId, GeoAnchor>,
}

impl GeoWorld {
    /// Create a world with one root at the cartesian origin
    pub fn new(config: GeoWorldConfig, map_type: MapType) -> Self {
        let mut roots = RootRegistry::new(config.max_rebase_history);
        roots.create();

        Self {
            config,
            map_type,
            spatial_reference: SpatialReferenceId::WGS84,
            projection_revision: 0,
            roots,
            anchors: HashMap::new(),
        }
    }

    /// The map's current projection family
    pub fn map_type(&self) -> MapType {
        self.map_type
    }

    /// The map's spatial reference (used for root orientation and for
    /// anchors attached without geographic state)
    pub fn spatial_reference(&self) -> SpatialReferenceId {
        self.spatial_reference
    }

    /// Counter bumped whenever the projection's meaning changes; derived
    /// caches (extents, framings) key on it
    pub fn projection_revision(&self) -> u64 {
        self.projection_revision
    }

    /// Runtime configuration
    pub fn config(&self) -> &GeoWorldConfig {
        &self.config
    }

    /// The default root created with the world
    pub fn default_root(&self) -> RootId {
        RootId::from_index(0)
    }

    /// Add another universe root
    pub fn create_root(&mut self) -> RootId {
        self.roots.create()
    }

    /// Look up a root
    pub fn root(&self, id: RootId) -> Option<&UniverseRoot> {
        self.roots.get(id)
    }

    /// Registry statistics
    pub fn root_stats(&self) -> RootStats {
        self.roots.stats()
    }

    /// Anchors currently attached
    pub fn anchors(&self) -> impl Iterator<Item = &GeoAnchor> {
        self.anchors.values()
    }

    /// A specific anchor
    pub fn anchor(&self, object: ObjectId) -> Option<&GeoAnchor> {
        self.anchors.get(&object)
    }

    /// Number of attached anchors
    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    /// Attach an object at a geographic position; the first tick pushes it
    /// into the engine transform
    pub fn attach(
        &mut self,
        object: ObjectId,
        root: RootId,
        position: GeographicPosition,
        rotation: GeographicRotation,
    ) {
        self.expect_root(root);
        if self.anchors.contains_key(&object) {
            debug!(?object, "re-attaching an already anchored object");
        }
        self.anchors
            .insert(object, GeoAnchor::from_geographic(object, root, position, rotation));
    }

    /// Attach an object where the host currently has it; the first tick
    /// pulls its geographic position from the engine transform
    pub fn attach_at_engine(&mut self, object: ObjectId, root: RootId) {
        self.expect_root(root);
        let reference = self.spatial_reference;
        self.anchors
            .insert(object, GeoAnchor::from_engine(object, root, reference));
    }

    /// Remove an object's anchor; the host transform is left as-is
    pub fn detach(&mut self, object: ObjectId) -> bool {
        self.anchors.remove(&object).is_some()
    }

    /// Re-bind an anchored object to a different root and force a full
    /// re-derivation
    pub fn rebind(&mut self, object: ObjectId, new_root: RootId) {
        self.expect_root(new_root);
        let anchor = self
            .anchors
            .get_mut(&object)
            .unwrap_or_else(|| panic!("cannot rebind {object:?}: object is not anchored"));
        anchor.rebind(new_root);
    }

    /// Flag or unflag an object as a rebase source
    pub fn set_rebase_source(&mut self, object: ObjectId, enabled: bool) -> bool {
        match self.anchors.get_mut(&object) {
            Some(anchor) => {
                anchor.set_rebase_source(enabled);
                true
            }
            None => false,
        }
    }

    /// Replace an object's geographic position (last write wins)
    pub fn set_geographic_position(&mut self, object: ObjectId, position: GeographicPosition) -> bool {
        match self.anchors.get_mut(&object) {
            Some(anchor) => {
                anchor.set_geographic_position(position);
                true
            }
            None => false,
        }
    }

    /// Replace an object's geographic rotation (last write wins)
    pub fn set_geographic_rotation(&mut self, object: ObjectId, rotation: GeographicRotation) -> bool {
        match self.anchors.get_mut(&object) {
            Some(anchor) => {
                anchor.set_geographic_rotation(rotation);
                true
            }
            None => false,
        }
    }

    /// Current geographic position of an anchored object
    pub fn geographic_position(&self, object: ObjectId) -> Option<GeographicPosition> {
        self.anchors.get(&object).map(GeoAnchor::geographic_position)
    }

    /// Current cartesian pose of an anchored object
    pub fn cartesian_pose(&self, object: ObjectId) -> Option<CartesianPose> {
        self.anchors.get(&object).map(GeoAnchor::cartesian_pose)
    }

    /// Synchronize a single object on demand, ahead of its next tick
    pub fn synchronize_object(
        &mut self,
        object: ObjectId,
        host: &mut dyn SceneHost,
        resolver: &dyn SpatialReferenceResolver,
    ) -> bool {
        let map_type = self.map_type;
        let config = &self.config;
        let roots = &self.roots;
        match self.anchors.get_mut(&object) {
            Some(anchor) => {
                let root = roots.get(anchor.root()).unwrap_or_else(|| {
                    panic!(
                        "anchor {:?} is bound to universe root {:?} which does not exist",
                        anchor.object(),
                        anchor.root()
                    )
                });
                anchor.synchronize(root, map_type, config, resolver, host);
                true
            }
            None => false,
        }
    }

    /// One cooperative update: synchronize everything, run the rebase pass,
    /// and close with a second synchronization if any root moved
    ///
    /// Returns the number of root promotions performed.
    pub fn tick(
        &mut self,
        host: &mut dyn SceneHost,
        resolver: &dyn SpatialReferenceResolver,
    ) -> usize {
        self.synchronize_all(host, resolver);

        let mut promotions: Vec<(RootId, DVec3, ObjectId, PromotionReason)> = Vec::new();
        for anchor in self.anchors.values() {
            let root = self.expect_anchor_root(anchor);
            if let Some(reason) = rebase::should_promote(anchor, root, &self.config) {
                promotions.push((
                    anchor.root(),
                    anchor.cartesian_pose().position,
                    anchor.object(),
                    reason,
                ));
            }
        }

        for (root, position, object, reason) in &promotions {
            info!(?object, ?reason, "promoting rebase source to universe root");
            self.apply_universe_position(*root, *position, host, resolver);
        }

        if !promotions.is_empty() {
            self.synchronize_all(host, resolver);
        }

        promotions.len()
    }

    /// Reposition a universe root explicitly
    ///
    /// The root's rotation is re-derived as the tangent frame at the new
    /// position, and every bound anchor is re-derived synchronously before
    /// this returns. Deferred (returns `false`) while the map's spatial
    /// reference is unresolved.
    pub fn set_universe_position(
        &mut self,
        root: RootId,
        position: DVec3,
        host: &mut dyn SceneHost,
        resolver: &dyn SpatialReferenceResolver,
    ) -> bool {
        self.expect_root(root);
        self.apply_universe_position(root, position, host, resolver)
    }

    /// Switch the projection family; always a full resynchronization
    pub fn set_map_type(&mut self, map_type: MapType) {
        if map_type == self.map_type {
            return;
        }
        info!(?map_type, "map type changed, forcing full resynchronization");
        self.map_type = map_type;
        self.invalidate_projection();
    }

    /// Switch the map's spatial reference; always a full resynchronization
    pub fn set_spatial_reference(&mut self, reference: SpatialReferenceId) {
        if reference == self.spatial_reference {
            return;
        }
        info!(?reference, "spatial reference changed, forcing full resynchronization");
        self.spatial_reference = reference;
        self.invalidate_projection();
    }

    pub(crate) fn clear_anchors(&mut self) {
        self.anchors.clear();
    }

    pub(crate) fn ensure_root_exists(&mut self, root: RootId) {
        while self.roots.len() <= root.index() as usize {
            self.roots.create();
        }
    }

    pub(crate) fn set_map_state(&mut self, map_type: MapType, reference: SpatialReferenceId) {
        self.map_type = map_type;
        self.spatial_reference = reference;
        self.invalidate_projection();
    }

    fn invalidate_projection(&mut self) {
        self.projection_revision += 1;
        for anchor in self.anchors.values_mut() {
            anchor.force_push();
        }
    }

    fn synchronize_all(&mut self, host: &mut dyn SceneHost, resolver: &dyn SpatialReferenceResolver) {
        let map_type = self.map_type;
        let config = &self.config;
        let roots = &self.roots;
        for anchor in self.anchors.values_mut() {
            let root = roots.get(anchor.root()).unwrap_or_else(|| {
                panic!(
                    "anchor {:?} is bound to universe root {:?} which does not exist",
                    anchor.object(),
                    anchor.root()
                )
            });
            anchor.synchronize(root, map_type, config, resolver, host);
        }
    }

    fn apply_universe_position(
        &mut self,
        root: RootId,
        position: DVec3,
        host: &mut dyn SceneHost,
        resolver: &dyn SpatialReferenceResolver,
    ) -> bool {
        let reference = match resolver.resolve(self.spatial_reference) {
            Resolution::Resolved(reference) => reference,
            Resolution::Unresolved => {
                debug!("root reposition deferred: map spatial reference unresolved");
                return false;
            }
        };

        let rotation = projection::tangent_frame(position, &reference, self.map_type);
        if !position.is_finite() || !rotation.is_finite() {
            warn!(?position, "refusing to move universe root to a non-finite pose");
            return false;
        }

        self.roots.set(root, position, rotation);
        let moved_root = *self.roots.get(root).expect("root vanished during reposition");

        // Synchronous fan-out: every clean bound anchor is re-derived before
        // we return; pending pushes recompute against the new root anyway.
        for anchor in self.anchors.values_mut() {
            if anchor.root() == root
                && anchor.state() == SyncState::Clean
                && anchor.has_synced()
            {
                anchor.reapply(&moved_root, host);
            }
        }

        true
    }

    fn expect_root(&self, root: RootId) {
        if self.roots.get(root).is_none() {
            panic!("universe root {root:?} does not exist");
        }
    }

    fn expect_anchor_root(&self, anchor: &GeoAnchor) -> &UniverseRoot {
        self.roots.get(anchor.root()).unwrap_or_else(|| {
            panic!(
                "anchor {:?} is bound to universe root {:?} which does not exist",
                anchor.object(),
                anchor.root()
            )
        })
    }
}
