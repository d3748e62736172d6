//! Applying mesh transforms for meshwarp
//!
//! This crate maps points, polygons and images through a displaced mesh:
//! - Walking point location with cached per-element affine maps
//! - Scan conversion of the displaced mesh into sorted raster intervals
//! - Nearest, bilinear and classifying resampling of grey values
//! - Object-level transforms, affine post-composition and tie-point meshes

pub mod locate;
pub mod resample;
pub mod scan;
pub mod transform_obj;

pub use locate::*;
pub use resample::{classify_value, linear_value, mesh_transform_values, Interpolation};
pub use scan::*;
pub use transform_obj::*;
