//! Mesh adaptation for meshwarp
//!
//! This crate removes nodes from a mesh transform until every element keeps
//! a usable area after displacement:
//! - Area-driven node removal with a canonical longest-edge choice

pub mod area_collapse;

pub use area_collapse::*;

use meshwarp_core::{MeshTransform, Result};

/// Adapt a mesh transform so that it is safe to apply
pub trait MeshAdaptor {
    /// Return an adapted copy; the input mesh is left untouched
    fn adapt(&self, mesh: &MeshTransform) -> Result<MeshTransform>;
}
