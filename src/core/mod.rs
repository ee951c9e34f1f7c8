//! Core synchronization machinery
//!
//! Leaves first: value types (`geo`, `transform`), then the root registry,
//! the per-object anchor state machine, the rebase trigger, and finally the
//! world that drives them all once per tick.

pub mod anchor;
pub mod geo;
pub mod rebase;
pub mod root;
pub mod transform;
pub mod world;


pub use anchor::{GeoAnchor, SyncState};
pub use geo::{GeographicPosition, GeographicRotation};
pub use rebase::PromotionReason;
pub use root::{RebaseRecord, RootId, RootRegistry, RootStats, UniverseRoot};
pub use transform::{CartesianPose, EngineTransform};
pub use world::GeoWorld;
