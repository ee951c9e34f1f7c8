//! Spatial reference identifiers and the resolver boundary

use super::ellipsoid::Ellipsoid;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A well-known spatial reference identifier (e.g. an EPSG code)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpatialReferenceId(pub i32);

impl SpatialReferenceId {
    /// WGS84 geographic coordinates, degrees
    pub const WGS84: SpatialReferenceId = SpatialReferenceId(4326);
    /// WGS 84 / Pseudo-Mercator, planar meters
    pub const WEB_MERCATOR: SpatialReferenceId = SpatialReferenceId(3857);
    /// Placeholder for "no reference assigned yet"
    pub const UNKNOWN: SpatialReferenceId = SpatialReferenceId(0);
}

/// A resolved spatial reference
///
/// The two variants select fundamentally different projector algebra:
/// geographic references carry angular degrees, projected references carry
/// planar meters.
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialReference {
    /// Angular coordinates (longitude/latitude degrees, meters of altitude)
    /// on the given ellipsoid
    Geographic(Ellipsoid),
    /// Planar coordinates in meters, georeferenced to the given ellipsoid
    Projected {
        ellipsoid: Ellipsoid,
        name: &'static str,
    },
}

impl SpatialReference {
    /// The ellipsoid this reference is defined against
    pub fn ellipsoid(&self) -> &Ellipsoid {
        match self {
            SpatialReference::Geographic(e) => e,
            SpatialReference::Projected { ellipsoid, .. } => ellipsoid,
        }
    }
}

/// Outcome of a resolver lookup
///
/// `Unresolved` is a deferral condition, never an error: callers retry on a
/// later tick once the external database has the reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(SpatialReference),
    Unresolved,
}

impl Resolution {
    /// Convert to an `Option`, discarding the deferral signal
    pub fn resolved(self) -> Option<SpatialReference> {
        match self {
            Resolution::Resolved(reference) => Some(reference),
            Resolution::Unresolved => None,
        }
    }
}

/// External collaborator contract: maps reference ids to their parameters
pub trait SpatialReferenceResolver {
    /// Look up a reference id
    ///
    /// Returns `Unresolved` for ids the backing database does not (yet) know;
    /// implementations must not treat that as fatal.
    fn resolve(&self, id: SpatialReferenceId) -> Resolution;
}

lazy_static! {
    static ref BUILTIN_TABLE: HashMap<SpatialReferenceId, SpatialReference> = {
        let mut table = HashMap::new();
        table.insert(
            SpatialReferenceId::WGS84,
            SpatialReference::Geographic(Ellipsoid::WGS84),
        );
        table.insert(
            SpatialReferenceId::WEB_MERCATOR,
            SpatialReference::Projected {
                ellipsoid: Ellipsoid::WGS84,
                name: "WGS 84 / Pseudo-Mercator",
            },
        );
        table.insert(
            SpatialReferenceId(32611),
            SpatialReference::Projected {
                ellipsoid: Ellipsoid::WGS84,
                name: "WGS 84 / UTM zone 11N",
            },
        );
        table
    };
}

/// Static-table resolver covering the common well-known references
///
/// Any id outside the table resolves to `Unresolved`, which makes this
/// resolver double as the "reference not yet available" test fixture.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinResolver;

impl SpatialReferenceResolver for BuiltinResolver {
    fn resolve(&self, id: SpatialReferenceId) -> Resolution {
        match BUILTIN_TABLE.get(&id) {
            Some(reference) => Resolution::Resolved(reference.clone()),
            None => Resolution::Unresolved,
        }
    }
}
