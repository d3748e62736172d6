//! Area-driven node removal
//!
//! Repeated passes over the live elements: any element whose source or
//! displaced double-area falls below twice the minimum area loses the node
//! opposite its longest displaced edge. Passes continue until one finds no
//! such element, then the mesh is squeezed.

use crate::MeshAdaptor;
use log::{debug, trace};
use meshwarp_core::{distance_sq, MeshTransform, Result};
use serde::{Deserialize, Serialize};

/// Local node to delete, keyed by the three pairwise comparisons of the
/// squared displaced edge lengths (edge `i` is opposite node `i`):
/// bit 2 `e2 > e0`, bit 1 `e1 > e2`, bit 0 `e0 > e1`.
const LONGEST_EDGE_NODE: [usize; 8] = [0, 0, 1, 0, 2, 2, 1, 0];

/// Configuration for area-driven adaptation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptConfig {
    /// Minimum element area, clamped to at least 1
    pub min_area: f64,
    /// Verify the adapted mesh, displacement included
    pub verify: bool,
}

impl Default for AdaptConfig {
    fn default() -> Self {
        Self {
            min_area: 1.0,
            verify: false,
        }
    }
}

impl AdaptConfig {
    pub fn new(min_area: f64) -> Self {
        Self {
            min_area,
            ..Self::default()
        }
    }

    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

impl MeshAdaptor for AdaptConfig {
    fn adapt(&self, mesh: &MeshTransform) -> Result<MeshTransform> {
        let adapted = mesh_transform_adapt(mesh, self.min_area)?;
        if self.verify {
            adapted.verify(true)?;
        }
        Ok(adapted)
    }
}

/// Local index of the node opposite the longest displaced edge of `elem`
fn longest_edge_node(mesh: &MeshTransform, elem: usize) -> usize {
    let [d0, d1, d2] = mesh.displaced_triangle(elem);
    let seg = [
        distance_sq(&d2, &d1),
        distance_sq(&d0, &d2),
        distance_sq(&d1, &d0),
    ];
    let key = (usize::from(seg[2] > seg[0]) << 2)
        | (usize::from(seg[1] > seg[2]) << 1)
        | usize::from(seg[0] > seg[1]);
    LONGEST_EDGE_NODE[key]
}

/// Copy `mesh` and delete nodes until every live element has source and
/// displaced area of at least `min_area`, which is clamped to at least 1.
pub fn mesh_transform_adapt(mesh: &MeshTransform, min_area: f64) -> Result<MeshTransform> {
    let min_area2 = 2.0 * min_area.max(1.0);
    let mut adapted = mesh.copy_squeezed()?;
    let start_elements = adapted.element_count();
    let start_nodes = adapted.node_count();

    let mut pass = 0;
    loop {
        pass += 1;
        let mut deleted = 0;
        for elem in 0..adapted.elements().len() {
            if adapted.elements()[elem].zombie {
                continue;
            }
            let s_area2 = adapted.source_area2(elem);
            let d_area2 = adapted.displaced_area2(elem);
            if s_area2 < min_area2 || d_area2 < min_area2 {
                let node = adapted.elements()[elem].nodes[longest_edge_node(&adapted, elem)];
                trace!(
                    "Element {} areas {:.3}/{:.3}, deleting node {}",
                    elem,
                    s_area2 / 2.0,
                    d_area2 / 2.0,
                    node
                );
                adapted.delete_node(elem, node)?;
                deleted += 1;
            }
        }
        debug!("Adapt pass {}: {} nodes deleted", pass, deleted);
        if deleted == 0 {
            break;
        }
    }
    adapted.squeeze()?;
    debug!(
        "Adapted mesh from {} nodes, {} elements to {} nodes, {} elements",
        start_nodes,
        start_elements,
        adapted.node_count(),
        adapted.element_count()
    );
    Ok(adapted)
}
