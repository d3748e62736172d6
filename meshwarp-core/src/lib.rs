//! Core data structures for meshwarp
//!
//! This crate provides the 2D mesh transform model and the pieces every
//! other meshwarp crate builds on: points and planar geometry, the
//! per-triangle affine solver, node insertion and deletion, and the
//! interval-domain object model that meshes are built from and applied to.

pub mod affine;
pub mod error;
pub mod fill;
pub mod mesh;
pub mod object;
pub mod point;
pub mod topology;
pub mod traits;
pub mod transform;

pub use affine::*;
pub use error::*;
pub use mesh::*;
pub use object::*;
pub use point::*;
pub use topology::*;
pub use traits::*;
pub use transform::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3, Point2, Vector2};
