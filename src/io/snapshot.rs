//! World snapshots: save/load of the durable subset
//!
//! Only the authoritative fields are persisted: map type, spatial reference
//! and each anchor's geographic state. Cached cartesian poses, engine
//! transforms and dirty flags are derived state: restoring a snapshot leaves
//! every anchor with a pending push, so the first tick after loading
//! recomputes all of it.

use crate::core::geo::{GeographicPosition, GeographicRotation};
use crate::core::root::RootId;
use crate::core::world::GeoWorld;
use crate::host::ObjectId;
use crate::projection::MapType;
use crate::spatial::SpatialReferenceId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Errors from snapshot file operations
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable state of one anchor
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnchorRecord {
    /// Host object handle
    pub object: u64,
    /// Universe root slot the anchor is bound to
    pub root: u32,
    /// Authoritative geographic position
    pub position: GeographicPosition,
    /// Authoritative geographic rotation
    pub rotation: GeographicRotation,
    /// Whether the object may promote its position to the root
    pub rebase_source: bool,
}

/// Durable state of a whole world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Projection family
    pub map_type: MapType,
    /// Map spatial reference
    pub spatial_reference: SpatialReferenceId,
    /// All anchors
    pub anchors: Vec<AnchorRecord>,
}

impl WorldSnapshot {
    /// Capture the durable subset of a world
    pub fn capture(world: &GeoWorld) -> Self {
        let mut anchors: Vec<AnchorRecord> = world
            .anchors()
            .map(|anchor| AnchorRecord {
                object: anchor.object().0,
                root: anchor.root().index(),
                position: anchor.geographic_position(),
                rotation: anchor.geographic_rotation(),
                rebase_source: anchor.is_rebase_source(),
            })
            .collect();
        // Stable output regardless of table iteration order
        anchors.sort_by_key(|record| record.object);

        debug!(anchors = anchors.len(), "captured world snapshot");
        Self {
            map_type: world.map_type(),
            spatial_reference: world.spatial_reference(),
            anchors,
        }
    }

    /// Replace a world's anchors and map state with this snapshot's
    ///
    /// Every restored anchor carries a pending push; run one full tick to
    /// rebuild the derived state.
    pub fn restore(&self, world: &mut GeoWorld) {
        world.clear_anchors();
        world.set_map_state(self.map_type, self.spatial_reference);

        for record in &self.anchors {
            let root = RootId::from_index(record.root);
            world.ensure_root_exists(root);
            world.attach(ObjectId(record.object), root, record.position, record.rotation);
            world.set_rebase_source(ObjectId(record.object), record.rebase_source);
        }

        info!(
            anchors = self.anchors.len(),
            "world state restored, full resynchronization pending"
        );
    }

    /// Serialize to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SnapshotError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        info!(path = ?path.as_ref(), "saved world snapshot");
        Ok(())
    }

    /// Deserialize from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let json = fs::read_to_string(path.as_ref())?;
        let snapshot = serde_json::from_str(&json)?;
        info!(path = ?path.as_ref(), "loaded world snapshot");
        Ok(snapshot)
    }
}
