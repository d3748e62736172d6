//! Closed-form per-triangle affine solve
//!
//! Every mesh element maps its source triangle onto its displaced triangle
//! with a single affine transform. The coefficients follow directly from
//! Cramer's rule on the vertex matrix, so solving is a fixed handful of
//! multiplications with no allocation.

use crate::point::{signed_area2, Point2d, MESH_TOLERANCE_SQ};
use serde::{Deserialize, Serialize};

/// Coefficients of `(x, y) -> (x[0]*x + x[1]*y + x[2], y[0]*x + y[1]*y + y[2])`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineCoeffs {
    pub x: [f64; 3],
    pub y: [f64; 3],
}

impl AffineCoeffs {
    /// The identity map
    pub fn identity() -> Self {
        Self {
            x: [1.0, 0.0, 0.0],
            y: [0.0, 1.0, 0.0],
        }
    }

    /// Solve for the map taking `src[i]` to `dst[i]`.
    ///
    /// `dd` is the signed double-area of the source triangle and must be
    /// non-zero; callers check it against [`MESH_TOLERANCE_SQ`] first.
    #[inline]
    pub fn solve(src: &[Point2d; 3], dst: &[Point2d; 3], dd: f64) -> Self {
        let dd = 1.0 / dd;
        let [s0, s1, s2] = src;
        let [d0, d1, d2] = dst;

        let t0 = s1.y - s2.y;
        let t1 = s2.y - s0.y;
        let t2 = s0.y - s1.y;
        let x0 = ((d0.x * t0) + (d1.x * t1) + (d2.x * t2)) * dd;
        let y0 = ((d0.y * t0) + (d1.y * t1) + (d2.y * t2)) * dd;

        let t0 = s2.x - s1.x;
        let t1 = s0.x - s2.x;
        let t2 = s1.x - s0.x;
        let x1 = ((d0.x * t0) + (d1.x * t1) + (d2.x * t2)) * dd;
        let y1 = ((d0.y * t0) + (d1.y * t1) + (d2.y * t2)) * dd;

        let t0 = (s1.x * s2.y) - (s2.x * s1.y);
        let t1 = (s2.x * s0.y) - (s0.x * s2.y);
        let t2 = (s0.x * s1.y) - (s1.x * s0.y);
        let x2 = ((d0.x * t0) + (d1.x * t1) + (d2.x * t2)) * dd;
        let y2 = ((d0.y * t0) + (d1.y * t1) + (d2.y * t2)) * dd;

        Self {
            x: [x0, x1, x2],
            y: [y0, y1, y2],
        }
    }

    /// Solve with the degeneracy check done here, `None` if the source
    /// triangle's double-area is below [`MESH_TOLERANCE_SQ`].
    pub fn try_solve(src: &[Point2d; 3], dst: &[Point2d; 3]) -> Option<Self> {
        let dd = signed_area2(&src[0], &src[1], &src[2]);
        (dd >= MESH_TOLERANCE_SQ).then(|| Self::solve(src, dst, dd))
    }

    /// Apply the map to a point
    #[inline]
    pub fn apply(&self, p: &Point2d) -> Point2d {
        Point2d::new(
            self.x[0] * p.x + self.x[1] * p.y + self.x[2],
            self.y[0] * p.x + self.y[1] * p.y + self.y[2],
        )
    }
}

impl Default for AffineCoeffs {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tri(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> [Point2d; 3] {
        [
            Point2d::new(a.0, a.1),
            Point2d::new(b.0, b.1),
            Point2d::new(c.0, c.1),
        ]
    }

    #[test]
    fn test_identity_solve() {
        let src = tri((0.0, 0.0), (10.0, 0.0), (0.0, 10.0));
        let tr = AffineCoeffs::try_solve(&src, &src).unwrap();
        assert_relative_eq!(tr.x[0], 1.0);
        assert_relative_eq!(tr.x[1], 0.0);
        assert_relative_eq!(tr.y[1], 1.0);
        let p = tr.apply(&Point2d::new(2.0, 2.0));
        assert_relative_eq!(p.x, 2.0);
        assert_relative_eq!(p.y, 2.0);
    }

    #[test]
    fn test_single_vertex_displacement() {
        let src = tri((0.0, 0.0), (10.0, 0.0), (0.0, 10.0));
        let dst = tri((0.0, 0.0), (15.0, 0.0), (0.0, 10.0));
        let tr = AffineCoeffs::try_solve(&src, &dst).unwrap();
        // x' = 1.5 x, y' = y
        assert_relative_eq!(tr.x[0], 1.5);
        assert_relative_eq!(tr.x[1], 0.0);
        assert_relative_eq!(tr.x[2], 0.0);
        let c = Point2d::new(10.0 / 3.0, 10.0 / 3.0);
        let p = tr.apply(&c);
        assert_relative_eq!(p.x, 5.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 10.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vertices_map_exactly() {
        let src = tri((1.0, 2.0), (7.0, 3.0), (2.0, 9.0));
        let dst = tri((4.0, -1.0), (11.0, 5.0), (-2.0, 8.0));
        let tr = AffineCoeffs::try_solve(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            let p = tr.apply(s);
            assert_relative_eq!(p.x, d.x, epsilon = 1e-9);
            assert_relative_eq!(p.y, d.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_forward_inverse_round_trip() {
        let src = tri((0.0, 0.0), (8.0, 1.0), (3.0, 6.0));
        let dst = tri((2.0, 1.0), (9.0, 4.0), (1.0, 8.0));
        let fwd = AffineCoeffs::try_solve(&src, &dst).unwrap();
        let inv = AffineCoeffs::try_solve(&dst, &src).unwrap();
        for s in &src {
            let back = inv.apply(&fwd.apply(s));
            assert_relative_eq!(back.x, s.x, epsilon = 1e-9);
            assert_relative_eq!(back.y, s.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_degenerate_source_rejected() {
        let src = tri((0.0, 0.0), (1.0, 1.0), (2.0, 2.0));
        assert!(AffineCoeffs::try_solve(&src, &src).is_none());
        // Clockwise sources are rejected too
        let cw = tri((0.0, 0.0), (0.0, 10.0), (10.0, 0.0));
        assert!(AffineCoeffs::try_solve(&cw, &cw).is_none());
    }
}
