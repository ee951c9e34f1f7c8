//! Persistence of the durable subset of world state

pub mod snapshot;

pub use snapshot::{AnchorRecord, SnapshotError, WorldSnapshot};
