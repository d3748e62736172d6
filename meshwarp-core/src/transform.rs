//! 2D affine transformation utilities

use crate::error::{Error, Result};
use crate::point::{Point2d, Vector2d};
use nalgebra::{DMatrix, DVector, Matrix3, Rotation2};
use serde::{Deserialize, Serialize};

/// A 2D affine transformation in homogeneous form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub matrix: Matrix3<f64>,
}

impl Transform2D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector2d) -> Self {
        Self {
            matrix: Matrix3::new_translation(&translation),
        }
    }

    /// Create a rotation about the origin, angle in radians
    pub fn rotation(angle: f64) -> Self {
        Self {
            matrix: Rotation2::new(angle).to_homogeneous(),
        }
    }

    /// Create a scaling transformation
    pub fn scaling(scale: Vector2d) -> Self {
        Self {
            matrix: Matrix3::new_nonuniform_scaling(&scale),
        }
    }

    /// Least-squares affine fit taking each `src[i]` as close as possible to `dst[i]`.
    pub fn fit_least_squares(src: &[Point2d], dst: &[Point2d]) -> Result<Self> {
        if src.is_empty() || src.len() != dst.len() {
            return Err(Error::ParamData(format!(
                "Need matching non-empty point sets, got {} and {}",
                src.len(),
                dst.len()
            )));
        }
        if src.len() == 1 {
            return Ok(Self::translation(dst[0] - src[0]));
        }
        let n = src.len();
        let a = DMatrix::from_fn(n, 3, |r, c| match c {
            0 => src[r].x,
            1 => src[r].y,
            _ => 1.0,
        });
        let bx = DVector::from_iterator(n, dst.iter().map(|p| p.x));
        let by = DVector::from_iterator(n, dst.iter().map(|p| p.y));
        let svd = a.svd(true, true);
        let cx = svd
            .solve(&bx, 1.0e-12)
            .map_err(|e| Error::DomainData(format!("Affine fit failed: {}", e)))?;
        let cy = svd
            .solve(&by, 1.0e-12)
            .map_err(|e| Error::DomainData(format!("Affine fit failed: {}", e)))?;
        Ok(Self {
            matrix: Matrix3::new(cx[0], cx[1], cx[2], cy[0], cy[1], cy[2], 0.0, 0.0, 1.0),
        })
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point2d) -> Point2d {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point2d::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Compose this transformation with another, `other` applied first
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Get the inverse transformation
    pub fn inverse(self) -> Option<Self> {
        self.matrix
            .try_inverse()
            .map(|inv_matrix| Self { matrix: inv_matrix })
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Transform2D {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

impl From<Matrix3<f64>> for Transform2D {
    fn from(matrix: Matrix3<f64>) -> Self {
        Self { matrix }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_translation_and_inverse() {
        let t = Transform2D::translation(Vector2d::new(3.0, -2.0));
        let p = t.transform_point(&Point2d::new(1.0, 1.0));
        assert_relative_eq!(p.x, 4.0);
        assert_relative_eq!(p.y, -1.0);
        let back = t.inverse().unwrap().transform_point(&p);
        assert_relative_eq!(back.x, 1.0);
        assert_relative_eq!(back.y, 1.0);
    }

    #[test]
    fn test_compose_order() {
        let s = Transform2D::scaling(Vector2d::new(2.0, 2.0));
        let t = Transform2D::translation(Vector2d::new(1.0, 0.0));
        // translate first, then scale
        let p = (s * t).transform_point(&Point2d::new(1.0, 1.0));
        assert_relative_eq!(p.x, 4.0);
        assert_relative_eq!(p.y, 2.0);
    }

    #[test]
    fn test_least_squares_recovers_exact_affine() {
        let truth = Transform2D::from(Matrix3::new(1.2, 0.1, 3.0, -0.2, 0.9, -1.0, 0.0, 0.0, 1.0));
        let src = vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(10.0, 0.0),
            Point2d::new(0.0, 10.0),
            Point2d::new(7.0, 5.0),
        ];
        let dst: Vec<Point2d> = src.iter().map(|p| truth.transform_point(p)).collect();
        let fit = Transform2D::fit_least_squares(&src, &dst).unwrap();
        assert_relative_eq!(fit.matrix, truth.matrix, epsilon = 1e-9);
    }

    #[test]
    fn test_least_squares_rejects_mismatch() {
        let src = vec![Point2d::new(0.0, 0.0)];
        assert!(matches!(
            Transform2D::fit_least_squares(&src, &[]),
            Err(Error::ParamData(_))
        ));
    }
}
