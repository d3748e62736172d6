//! # meshwarp
//!
//! Piecewise-affine 2D warping of images, polygons and points through
//! triangular mesh transforms.
//!
//! This is the umbrella crate that provides convenient access to all meshwarp
//! functionality. You can use this crate to get everything in one place, or
//! use individual crates for more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: Mesh model, affine solver, node insertion and deletion, 2D objects
//! - **Build**: Bounding box, block and gradient-adaptive mesh construction
//! - **Simplification**: Area-driven mesh adaptation
//! - **Transform**: Point location, scan conversion and image resampling
//!
//! ## Quick Start
//!
//! ```rust
//! use meshwarp::prelude::*;
//!
//! let obj = Object::Domain2D(DomainObject::new(IntervalDomain::from_rect(0, 0, 63, 63), None));
//! let mut mesh = mesh_from_obj(&obj, &MeshGenConfig::default().with_min_dist(8.0)).unwrap();
//! mesh.set_displacements(&|p: &Point2d| Vector2d::new(0.05 * p.y, 0.0));
//!
//! let p = mesh_transform_vertex(&mesh, &Point2d::new(10.0, 20.0)).unwrap();
//! assert!((p.x - 11.0).abs() < 1e-9);
//!
//! let warped = mesh_transform_obj(&obj, &mesh, Interpolation::Linear).unwrap();
//! assert!(matches!(warped, Object::Domain2D(_)));
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables build, simplification and transform
//! - `build`: Mesh construction
//! - `simplification`: Mesh adaptation
//! - `transform`: Applying meshes (pulls in build and simplification)
//! - `parallel`: Rayon for gradient images and interval sorting
//! - `all`: Enables all features

// Re-export core functionality
pub use meshwarp_core::*;

// Re-export sub-crates
#[cfg(feature = "build")]
pub use meshwarp_build as build;

#[cfg(feature = "simplification")]
pub use meshwarp_simplification as simplification;

#[cfg(feature = "transform")]
pub use meshwarp_transform as transform;

/// Convenient imports for common use cases
pub mod prelude {
    pub use meshwarp_core::*;

    #[cfg(feature = "build")]
    pub use meshwarp_build::*;

    #[cfg(feature = "simplification")]
    pub use meshwarp_simplification::*;

    #[cfg(feature = "transform")]
    pub use meshwarp_transform::*;
}
