//! Uniform block meshes
//!
//! Square cells of side `dist`, each split into two triangles, covering the
//! filled convex hull of the object's domain dilated by a disc of radius
//! `dist`.

use crate::morphology::{convex_hull, disc_dilation, fill_convex_polygon};
use log::debug;
use meshwarp_core::{
    Error, IntervalDomain, MeshTransform, Node, NodeOrigin, Object, Point2d, Point2i, Result,
};

/// Column range `[left, right)` of cells in one band, in cell units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRun {
    left: i32,
    right: i32,
}

impl CellRun {
    fn len(&self) -> usize {
        (self.right - self.left).max(0) as usize
    }
}

/// Cell runs per band for a convex domain, bands being `dist` lines high
/// starting at `org.y`. Each band takes the extent of every row it touches,
/// including the row on its upper edge.
///
/// The hull is covered by per-band unions of row extents rather than by
/// extrema propagated from line to line.
fn band_runs(cv: &IntervalDomain, org: Point2i, dist: i32) -> Vec<CellRun> {
    let last = cv.last_line();
    let n_bands = ((last - org.y) / dist + 1) as usize;
    (0..n_bands)
        .map(|b| {
            let y0 = org.y + b as i32 * dist;
            let y1 = (y0 + dist).min(last);
            let (mut lft, mut rgt) = (i32::MAX, i32::MIN);
            for y in y0..=y1 {
                for itv in cv.line(y) {
                    lft = lft.min(itv.left);
                    rgt = rgt.max(itv.right);
                }
            }
            if lft > rgt {
                CellRun { left: 0, right: 0 }
            } else {
                CellRun {
                    left: (lft - org.x).div_euclid(dist),
                    right: (rgt - org.x).div_euclid(dist) + 1,
                }
            }
        })
        .collect()
}

/// Build a block mesh over a 2D domain object with node spacing `dist`.
///
/// Cells cover the filled convex hull with band unions rather than per-line
/// propagated extrema, so no hull pixel is left outside the mesh.
pub fn mesh_from_obj_block(obj: &Object, dist: i32) -> Result<MeshTransform> {
    if dist < 1 {
        return Err(Error::ParamData(format!(
            "Block mesh spacing {} is less than 1",
            dist
        )));
    }
    let domain = &obj.as_domain_2d()?.domain;
    if domain.is_empty() {
        return Err(Error::DomainNull);
    }
    let dilated = disc_dilation(domain, dist)?;
    let cv = fill_convex_polygon(&convex_hull(&dilated))?;
    let bbox = cv.bounding_box().ok_or(Error::DomainNull)?;
    let org = Point2i::new(bbox.x_min, bbox.y_min);

    let bands = band_runs(&cv, org, dist);
    let n_lines = bands.len() + 1;

    // Node runs per line: the union of the cell runs above and below
    let lines: Vec<CellRun> = (0..n_lines)
        .map(|l| {
            let below = l.checked_sub(1).map(|b| bands[b]).filter(|r| r.len() > 0);
            let above = bands.get(l).copied().filter(|r| r.len() > 0);
            match (below, above) {
                (Some(a), Some(b)) => CellRun {
                    left: a.left.min(b.left),
                    right: a.right.max(b.right) + 1,
                },
                (Some(r), None) | (None, Some(r)) => CellRun {
                    left: r.left,
                    right: r.right + 1,
                },
                (None, None) => CellRun { left: 0, right: 0 },
            }
        })
        .collect();

    let mut line_start = Vec::with_capacity(n_lines);
    let mut n_nodes = 0;
    for run in &lines {
        line_start.push(n_nodes);
        n_nodes += run.len();
    }
    let mut band_start = Vec::with_capacity(bands.len());
    let mut n_elems = 0;
    for run in &bands {
        band_start.push(n_elems);
        n_elems += 2 * run.len();
    }

    let mut mesh = MeshTransform::new(n_nodes, n_elems)?;
    for (l, run) in lines.iter().enumerate() {
        let y = (org.y + l as i32 * dist) as f64;
        for k in run.left..run.right {
            let x = (org.x + k * dist) as f64;
            mesh.push_node(Node::new(Point2d::new(x, y), NodeOrigin::Block))?;
        }
    }
    let node_at = |l: usize, k: i32| line_start[l] + (k - lines[l].left) as usize;

    for (b, run) in bands.iter().enumerate() {
        for k in run.left..run.right {
            let lo = [node_at(b, k), node_at(b, k + 1)];
            let hi = [node_at(b + 1, k), node_at(b + 1, k + 1)];
            mesh.push_element([lo[0], lo[1], hi[0]])?;
            mesh.push_element([hi[1], hi[0], lo[1]])?;
        }
    }

    let elem_lo = |b: usize, k: i32| band_start[b] + 2 * (k - bands[b].left) as usize;
    for (b, run) in bands.iter().enumerate() {
        for k in run.left..run.right {
            let lo = elem_lo(b, k);
            let hi = lo + 1;
            mesh.set_neighbour(lo, 0, Some(hi))?;
            mesh.set_neighbour(hi, 0, Some(lo))?;
            if k > run.left {
                mesh.set_neighbour(lo, 1, Some(lo - 1))?;
                mesh.set_neighbour(lo - 1, 1, Some(lo))?;
            }
            if b > 0 {
                let prev = bands[b - 1];
                if k >= prev.left && k < prev.right {
                    let below = elem_lo(b - 1, k) + 1;
                    mesh.set_neighbour(lo, 2, Some(below))?;
                    mesh.set_neighbour(below, 2, Some(lo))?;
                }
            }
        }
    }

    debug!(
        "Block mesh: {} nodes, {} elements, {} bands at spacing {}",
        n_nodes,
        n_elems,
        bands.len(),
        dist
    );
    Ok(mesh)
}
