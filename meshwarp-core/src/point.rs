//! Point types and planar geometry primitives

use nalgebra::{Point2, Vector2};

/// A 2D point with double precision coordinates
pub type Point2d = Point2<f64>;

/// A 2D vector with double precision components
pub type Vector2d = Vector2<f64>;

/// A 2D point on the integer pixel lattice
pub type Point2i = Point2<i32>;

/// Distance below which two mesh coordinates are considered equal.
pub const MESH_TOLERANCE: f64 = 1.0e-4;

/// Square of [`MESH_TOLERANCE`], the degeneracy threshold for double-areas.
pub const MESH_TOLERANCE_SQ: f64 = MESH_TOLERANCE * MESH_TOLERANCE;

/// Smallest double-area an element may have, that of an equilateral triangle
/// with sides of [`MESH_TOLERANCE`].
pub const MESH_ELEM_AREA_TOLERANCE: f64 = 0.866_025_403_784_438_6 * MESH_TOLERANCE_SQ;

/// Round to the nearest integer, halves away from zero.
#[inline]
pub fn nint(x: f64) -> i32 {
    if x < 0.0 {
        (x - 0.5) as i32
    } else {
        (x + 0.5) as i32
    }
}

/// Twice the signed area of the triangle `(p0, p1, p2)`, positive when the
/// vertices are counter-clockwise.
#[inline]
pub fn signed_area2(p0: &Point2d, p1: &Point2d, p2: &Point2d) -> f64 {
    (p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)
}

/// Twice the signed area of a closed polygon, positive when counter-clockwise.
pub fn polygon_area2(vertices: &[Point2d]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| {
            let a = &vertices[i];
            let b = &vertices[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum()
}

/// Squared distance between two points.
#[inline]
pub fn distance_sq(p0: &Point2d, p1: &Point2d) -> f64 {
    (p1 - p0).norm_squared()
}

/// Circumcentre and squared circumradius of a triangle, `None` when the
/// triangle is degenerate.
pub fn circumcircle(p0: &Point2d, p1: &Point2d, p2: &Point2d) -> Option<(Point2d, f64)> {
    let b = p1 - p0;
    let c = p2 - p0;
    let d = 2.0 * (b.x * c.y - b.y * c.x);
    if d.abs() < MESH_TOLERANCE_SQ {
        return None;
    }
    let b2 = b.norm_squared();
    let c2 = c.norm_squared();
    let ux = (c.y * b2 - b.y * c2) / d;
    let uy = (b.x * c2 - c.x * b2) / d;
    let centre = Point2d::new(p0.x + ux, p0.y + uy);
    Some((centre, ux * ux + uy * uy))
}

/// True if `p` lies strictly inside the circumcircle of `(p0, p1, p2)`.
pub fn in_circumcircle(p0: &Point2d, p1: &Point2d, p2: &Point2d, p: &Point2d) -> bool {
    match circumcircle(p0, p1, p2) {
        Some((centre, radius_sq)) => distance_sq(&centre, p) < radius_sq - MESH_TOLERANCE_SQ,
        None => false,
    }
}
