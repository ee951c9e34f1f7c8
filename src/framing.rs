//! Extent framing: moving a camera so an area fits its view
//!
//! "Zoom to" waits for an externally-loaded extent and, once it is known,
//! pushes a single geographic write to the target anchor. The write is
//! all-or-nothing: a failed, cancelled or timed-out load leaves the target
//! exactly where it was.

use crate::core::geo::{GeographicPosition, GeographicRotation};
use crate::core::world::GeoWorld;
use crate::host::ObjectId;
use crate::loading::{LoadFuture, LoadStatus};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A geographic area described by its center and planar size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeographicExtent {
    /// Center of the area
    pub center: GeographicPosition,
    /// East-west size in meters
    pub width_m: f64,
    /// North-south size in meters
    pub height_m: f64,
}

impl GeographicExtent {
    /// Create a new extent
    pub fn new(center: GeographicPosition, width_m: f64, height_m: f64) -> Self {
        Self {
            center,
            width_m,
            height_m,
        }
    }

    /// Whether the extent can be framed at all
    pub fn is_valid(&self) -> bool {
        self.center.has_finite_coordinates()
            && self.width_m.is_finite()
            && self.height_m.is_finite()
            && self.width_m > 0.0
            && self.height_m > 0.0
    }
}

/// Terminal and non-terminal outcomes of a framing operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingOutcome {
    /// Extent not loaded yet; try again next tick
    Waiting,
    /// The camera write was applied
    Applied,
    /// The load failed or delivered an unusable extent
    Failed,
    /// The consumer cancelled the load
    Cancelled,
    /// The load deadline passed
    TimedOut,
}

impl FramingOutcome {
    /// Whether the operation will make no further progress
    pub fn is_terminal(self) -> bool {
        self != FramingOutcome::Waiting
    }
}

/// A pending "zoom to extent" against one target object
///
/// Poll with [`FramingOperation::tick`] once per world tick; the operation
/// never blocks.
pub struct FramingOperation {
    target: ObjectId,
    vertical_fov_deg: f64,
    future: LoadFuture<GeographicExtent>,
    outcome: Option<FramingOutcome>,
}

impl FramingOperation {
    /// Frame whatever extent the future eventually delivers, viewed with the
    /// given vertical field of view
    pub fn new(target: ObjectId, vertical_fov_deg: f64, future: LoadFuture<GeographicExtent>) -> Self {
        Self {
            target,
            vertical_fov_deg,
            future,
            outcome: None,
        }
    }

    /// The object this operation will move
    pub fn target(&self) -> ObjectId {
        self.target
    }

    /// Give up; the target is left untouched
    pub fn cancel(&mut self) {
        if self.outcome.is_none() {
            self.future.cancel();
            self.outcome = Some(FramingOutcome::Cancelled);
        }
    }

    /// Poll the pending load and apply the framing write when it is ready
    ///
    /// Terminal outcomes are sticky: once resolved, further ticks return the
    /// same outcome without touching the world again.
    pub fn tick(&mut self, world: &mut GeoWorld) -> FramingOutcome {
        if let Some(outcome) = self.outcome {
            return outcome;
        }

        let outcome = match self.future.poll() {
            LoadStatus::Pending => return FramingOutcome::Waiting,
            LoadStatus::Cancelled => FramingOutcome::Cancelled,
            LoadStatus::TimedOut => {
                debug!(target = ?self.target, "extent load timed out, framing abandoned");
                FramingOutcome::TimedOut
            }
            LoadStatus::Failed => {
                warn!(
                    target = ?self.target,
                    error = ?self.future.error(),
                    "extent load failed, framing abandoned"
                );
                FramingOutcome::Failed
            }
            LoadStatus::Ready => {
                let extent = self.future.try_take().expect("ready load lost its value");
                self.apply(world, &extent)
            }
        };

        self.outcome = Some(outcome);
        outcome
    }

    fn apply(&self, world: &mut GeoWorld, extent: &GeographicExtent) -> FramingOutcome {
        if !extent.is_valid() {
            warn!(target = ?self.target, ?extent, "unusable extent, framing abandoned");
            return FramingOutcome::Failed;
        }

        let distance = framing_distance(extent, self.vertical_fov_deg);
        let eye = GeographicPosition::new(
            extent.center.x,
            extent.center.y,
            extent.center.z + distance,
            extent.center.spatial_reference,
        );

        if !world.set_geographic_position(self.target, eye) {
            warn!(target = ?self.target, "framing target is not anchored");
            return FramingOutcome::Failed;
        }
        // Top-down view over the extent
        world.set_geographic_rotation(self.target, GeographicRotation::new(0.0, -90.0, 0.0));

        FramingOutcome::Applied
    }
}

/// Viewing distance at which the extent's larger side fits the view
fn framing_distance(extent: &GeographicExtent, vertical_fov_deg: f64) -> f64 {
    let half_angle = (vertical_fov_deg.to_radians() / 2.0).tan();
    (extent.width_m.max(extent.height_m) / 2.0) / half_angle
}

/// Extent cache keyed by projection revision
///
/// Extents computed under one projection are meaningless under another, so a
/// map-type or spatial-reference change invalidates everything at once simply
/// by bumping the world's revision; stale entries are never returned.
#[derive(Debug, Default)]
pub struct ExtentCache {
    entries: HashMap<ObjectId, (u64, GeographicExtent)>,
}

impl ExtentCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an extent computed under the given projection revision
    pub fn insert(&mut self, object: ObjectId, revision: u64, extent: GeographicExtent) {
        self.entries.insert(object, (revision, extent));
    }

    /// Fetch an extent if it is still valid under the given revision
    pub fn get(&self, object: ObjectId, revision: u64) -> Option<&GeographicExtent> {
        match self.entries.get(&object) {
            Some((cached_revision, extent)) if *cached_revision == revision => Some(extent),
            _ => None,
        }
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, including stale ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
