//! Bulk node insertion from point lists, interval domains and polygons

use crate::error::{Error, Result};
use crate::mesh::{MeshTransform, NodeOrigin};
use crate::object::{IntervalDomain, PolygonDomain};
use crate::point::{distance_sq, Point2d, Vector2d};
use crate::topology::NodeInsert;
use log::{debug, warn};

impl MeshTransform {
    fn require_elements(&self) -> Result<()> {
        if self.element_count() == 0 {
            return Err(Error::DomainData(
                "Cannot add nodes to a mesh without elements".to_string(),
            ));
        }
        Ok(())
    }

    /// Insert a run of points. A point closer than `min_dist` to the last
    /// inserted point is not tried. Returns the number of nodes added.
    pub fn add_points<I>(&mut self, points: I, min_dist: f64, origin: NodeOrigin) -> Result<usize>
    where
        I: IntoIterator<Item = Point2d>,
    {
        self.require_elements()?;
        let min_dist_sq = min_dist * min_dist;
        let mut last: Option<Point2d> = None;
        let mut hint = 0;
        let mut added = 0;
        for p in points {
            if last.is_some_and(|l| distance_sq(&l, &p) < min_dist_sq) {
                continue;
            }
            match self.add_node(hint, p, min_dist, origin)? {
                NodeInsert::Inserted { element, .. } => {
                    hint = element;
                    last = Some(p);
                    added += 1;
                }
                NodeInsert::Existing { element, .. } => hint = element,
                NodeInsert::Rejected => {}
                result @ (NodeInsert::Degenerate | NodeInsert::Outside) => {
                    warn!("Could not insert node at ({}, {}): {:?}", p.x, p.y, result);
                }
            }
        }
        Ok(added)
    }

    /// Insert a node for every pixel of `domain`, pixel `(x, y)` being placed
    /// at `(x * scale.x, y * scale.y)`.
    pub fn add_domain_points(
        &mut self,
        domain: &IntervalDomain,
        min_dist: f64,
        scale: Vector2d,
    ) -> Result<usize> {
        let points = domain
            .pixels()
            .map(|px| Point2d::new(px.x as f64 * scale.x, px.y as f64 * scale.y));
        let added = self.add_points(points, min_dist, NodeOrigin::IntervalDomain)?;
        debug!(
            "Added {} of {} domain points at spacing {}",
            added,
            domain.area(),
            min_dist
        );
        Ok(added)
    }

    /// Insert a polygon's vertices, then extra nodes evenly spaced along each
    /// side: `floor(len / (2 * min_dist))` per side.
    pub fn add_polygon(&mut self, polygon: &PolygonDomain, min_dist: f64) -> Result<usize> {
        let vertices = &polygon.vertices;
        if vertices.is_empty() {
            return Ok(0);
        }
        let mut between = Vec::new();
        if vertices.len() > 1 && min_dist > 0.0 {
            let step_sq = 4.0 * min_dist * min_dist;
            let mut prev = vertices[vertices.len() - 1];
            for &v in vertices {
                let d = v - prev;
                let count = (d.norm_squared() / step_sq).sqrt().floor() as usize;
                between.try_reserve(count)?;
                let parts = (count + 1) as f64;
                for k in 1..=count {
                    between.push(prev + d * (k as f64 / parts));
                }
                prev = v;
            }
        }
        let mut added = self.add_points(vertices.iter().copied(), min_dist, NodeOrigin::Polygon)?;
        added += self.add_points(between, min_dist, NodeOrigin::Polygon)?;
        debug!(
            "Added {} polygon nodes from {} vertices",
            added,
            vertices.len()
        );
        Ok(added)
    }
}
