//! Point location and vertex transforms
//!
//! A [`MeshLocator`] keeps the element it last stopped in together with that
//! element's affine map, so runs of nearby points (polygon vertices, for
//! example) walk only a step or two each.

use meshwarp_core::{
    nint, AffineCoeffs, BoundList, Error, MeshTransform, Point2d, PolygonDomain, Result,
    VertexKind,
};

/// Walking point locator over the source positions of a mesh
#[derive(Debug, Clone)]
pub struct MeshLocator<'a> {
    mesh: &'a MeshTransform,
    current: usize,
    affine: Option<AffineCoeffs>,
}

impl<'a> MeshLocator<'a> {
    pub fn new(mesh: &'a MeshTransform) -> Self {
        Self {
            mesh,
            current: 0,
            affine: None,
        }
    }

    /// Element the last located point fell in
    pub fn current_element(&self) -> usize {
        self.current
    }

    /// Element whose source triangle contains `p`, walking from the last one
    pub fn locate(&mut self, p: &Point2d) -> Result<usize> {
        let elem = self.mesh.walk(self.current, p)?;
        if elem != self.current {
            self.current = elem;
            self.affine = None;
        }
        Ok(elem)
    }

    /// Map a source point to its displaced position
    pub fn transform_point(&mut self, p: &Point2d) -> Result<Point2d> {
        let elem = self.locate(p)?;
        let affine = match self.affine {
            Some(affine) => affine,
            None => {
                let src = self.mesh.source_triangle(elem);
                let dst = self.mesh.displaced_triangle(elem);
                let affine = AffineCoeffs::try_solve(&src, &dst).ok_or_else(|| {
                    Error::DomainData(format!("Element {} is degenerate", elem))
                })?;
                self.affine = Some(affine);
                affine
            }
        };
        Ok(affine.apply(p))
    }

    /// Transform points in place, failing on the first point outside the mesh
    pub fn transform_points(&mut self, points: &mut [Point2d]) -> Result<()> {
        for p in points.iter_mut() {
            *p = self.transform_point(p)?;
        }
        Ok(())
    }

    /// Transform a polygon's vertices. Integer polygons are rounded.
    pub fn transform_polygon(&mut self, polygon: &PolygonDomain) -> Result<PolygonDomain> {
        let mut vertices = polygon.vertices.clone();
        self.transform_points(&mut vertices)?;
        if polygon.kind == VertexKind::Int {
            for v in vertices.iter_mut() {
                *v = Point2d::new(nint(v.x) as f64, nint(v.y) as f64);
            }
        }
        Ok(PolygonDomain::new(polygon.kind, vertices))
    }

    /// Transform every polygon of a boundary list tree
    pub fn transform_boundlist(&mut self, bound: &BoundList) -> Result<BoundList> {
        let polygon = bound
            .polygon
            .as_ref()
            .map(|p| self.transform_polygon(p))
            .transpose()?;
        let next = match bound.next.as_deref() {
            Some(b) => Some(Box::new(self.transform_boundlist(b)?)),
            None => None,
        };
        let down = match bound.down.as_deref() {
            Some(b) => Some(Box::new(self.transform_boundlist(b)?)),
            None => None,
        };
        Ok(BoundList {
            kind: bound.kind,
            wrap: bound.wrap,
            polygon,
            next,
            down,
        })
    }
}

/// Displaced position of a single source point
pub fn mesh_transform_vertex(mesh: &MeshTransform, p: &Point2d) -> Result<Point2d> {
    MeshLocator::new(mesh).transform_point(p)
}

/// Transform a polygon through the mesh
pub fn mesh_transform_polygon(mesh: &MeshTransform, polygon: &PolygonDomain) -> Result<PolygonDomain> {
    MeshLocator::new(mesh).transform_polygon(polygon)
}

/// Transform a boundary list through the mesh
pub fn mesh_transform_boundlist(mesh: &MeshTransform, bound: &BoundList) -> Result<BoundList> {
    MeshLocator::new(mesh).transform_boundlist(bound)
}
