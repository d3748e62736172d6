//! Core traits for meshwarp

use crate::mesh::MeshTransform;
use crate::point::{Point2d, Vector2d};

/// A displacement defined everywhere in the plane, such as a fitted
/// radial basis function transform.
pub trait DisplacementField {
    /// Displacement for a point at rest position `position`
    fn displacement(&self, position: &Point2d) -> Vector2d;
}

impl<F> DisplacementField for F
where
    F: Fn(&Point2d) -> Vector2d,
{
    fn displacement(&self, position: &Point2d) -> Vector2d {
        self(position)
    }
}

impl MeshTransform {
    /// Set every live node's displacement from `field`
    pub fn set_displacements<D: DisplacementField + ?Sized>(&mut self, field: &D) {
        for (position, displacement) in self.displacements_mut() {
            *displacement = field.displacement(&position);
        }
    }
}
