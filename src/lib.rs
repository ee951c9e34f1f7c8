//! Double-precision world anchoring for geographically-referenced scenes
//!
//! This crate keeps three coordinate spaces consistent: authoritative
//! geographic positions (longitude/latitude/altitude in a named spatial
//! reference), a derived double-precision cartesian space, and the
//! single-precision local space of a scene host. A movable universe root
//! ties the last two together; rebasing the root keeps local coordinates
//! numerically small no matter where on the reference the scene plays out.

pub mod config;
pub mod core;
pub mod framing;
pub mod host;
pub mod io;
pub mod loading;
pub mod projection;
pub mod spatial;

// Re-export commonly used types
pub mod prelude {
    // Core synchronization types
    pub use crate::core::{
        CartesianPose, EngineTransform, GeoAnchor, GeoWorld, GeographicPosition,
        GeographicRotation, RootId, SyncState, UniverseRoot,
    };

    // Spatial reference types
    pub use crate::spatial::{
        BuiltinResolver, Resolution, SpatialReference, SpatialReferenceId,
        SpatialReferenceResolver,
    };

    // Projection types
    pub use crate::projection::MapType;

    // Host types
    pub use crate::host::{EngineWorld, ObjectId, SceneHost};

    // Loading and framing types
    pub use crate::framing::{FramingOperation, FramingOutcome, GeographicExtent};
    pub use crate::loading::{load_channel, LoadFuture, LoadPromise, LoadStatus};

    // Config types
    pub use crate::config::GeoWorldConfig;

    // Math types
    pub use glam::{DQuat, DVec3, Quat, Vec3};
}

/// Initialize logging for the library
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
