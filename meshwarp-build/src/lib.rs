//! Mesh construction for meshwarp
//!
//! This crate builds initial mesh transforms over 2D domain objects:
//! - Two-triangle meshes over a bounding box
//! - Uniform block meshes clipped to the object's dilated convex hull
//! - Boundary-conforming meshes refined by the grey-value gradient

pub mod bbox;
pub mod block;
pub mod boundary;
pub mod gradient;
pub mod image;
pub mod morphology;

pub use bbox::*;
pub use block::*;
pub use boundary::*;
pub use gradient::*;
pub use image::*;
pub use morphology::*;

use meshwarp_core::{nint, MeshTransform, Object, Result};
use serde::{Deserialize, Serialize};

/// Mesh generation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeshGenMethod {
    /// Regular grid of square cells
    #[default]
    Block,
    /// Boundary polygon plus gradient-driven interior nodes
    Gradient,
}

/// Configuration for [`mesh_from_obj`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshGenConfig {
    pub method: MeshGenMethod,
    /// Block spacing, or the finest gradient spacing
    pub min_dist: f64,
    /// Coarsest gradient spacing
    pub max_dist: f64,
}

impl Default for MeshGenConfig {
    fn default() -> Self {
        Self {
            method: MeshGenMethod::Block,
            min_dist: 10.0,
            max_dist: 40.0,
        }
    }
}

impl MeshGenConfig {
    pub fn with_method(mut self, method: MeshGenMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_min_dist(mut self, min_dist: f64) -> Self {
        self.min_dist = min_dist;
        self
    }

    pub fn with_max_dist(mut self, max_dist: f64) -> Self {
        self.max_dist = max_dist;
        self
    }
}

/// Build a mesh for a 2D domain object. Distances are rounded to the
/// nearest integer magnitude.
pub fn mesh_from_obj(obj: &Object, config: &MeshGenConfig) -> Result<MeshTransform> {
    let min_dist = nint(config.min_dist.abs());
    let max_dist = nint(config.max_dist.abs());
    match config.method {
        MeshGenMethod::Block => mesh_from_obj_block(obj, min_dist),
        MeshGenMethod::Gradient => mesh_from_obj_gradient(obj, min_dist, max_dist),
    }
}

/// Trait for mesh builders
pub trait MeshBuilder {
    /// Build a mesh transform covering the object
    fn build(&self, obj: &Object) -> Result<MeshTransform>;
}

impl MeshBuilder for MeshGenConfig {
    fn build(&self, obj: &Object) -> Result<MeshTransform> {
        mesh_from_obj(obj, self)
    }
}
