//! Spatial references and their resolution
//!
//! A spatial reference names the coordinate system a geographic position is
//! expressed in. The reference database itself is an external collaborator;
//! this module defines the resolver boundary and ships a small built-in table
//! of well-known references for tests and standalone use.

pub mod ellipsoid;
pub mod reference;

pub use ellipsoid::Ellipsoid;
pub use reference::{
    BuiltinResolver, Resolution, SpatialReference, SpatialReferenceId, SpatialReferenceResolver,
};
