//! Triangular mesh transform model
//!
//! Nodes carry a rest position and a displacement. Elements are
//! counter-clockwise triangles of node indices together with the index of
//! the element across each edge: neighbour slot `i` is the element sharing
//! the edge opposite local vertex `i`, that is the edge between local
//! vertices `(i + 1) % 3` and `(i + 2) % 3`.
//!
//! Deletion only marks nodes and elements dead. Indices held by callers stay
//! valid until [`MeshTransform::squeeze`] repacks the arrays.

use crate::error::{Error, MeshErrorKind, Result};
use crate::point::{signed_area2, Point2d, Vector2d, MESH_TOLERANCE_SQ};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a node came to be in the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeOrigin {
    /// Temporary bounding box corner
    BoundingBox,
    /// Regular block grid
    Block,
    /// Sample point of an interval domain
    IntervalDomain,
    /// Vertex of a boundary polygon
    Polygon,
}

/// A mesh node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub position: Point2d,
    pub displacement: Vector2d,
    pub origin: NodeOrigin,
    pub deleted: bool,
}

impl Node {
    /// Node at `position` with zero displacement
    pub fn new(position: Point2d, origin: NodeOrigin) -> Self {
        Self {
            position,
            displacement: Vector2d::zeros(),
            origin,
            deleted: false,
        }
    }

    /// Position after displacement
    #[inline]
    pub fn displaced(&self) -> Point2d {
        self.position + self.displacement
    }
}

/// A triangular mesh element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: usize,
    pub nodes: [usize; 3],
    pub neighbours: [Option<usize>; 3],
    pub zombie: bool,
}

impl Element {
    pub fn new(id: usize, nodes: [usize; 3]) -> Self {
        Self {
            id,
            nodes,
            neighbours: [None; 3],
            zombie: false,
        }
    }

    /// Local index of `node` in this element
    #[inline]
    pub fn local_index(&self, node: usize) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }

    /// Slot whose edge joins nodes `a` and `b` (either order)
    pub fn edge_slot(&self, a: usize, b: usize) -> Option<usize> {
        (0..3).find(|&i| {
            let n1 = self.nodes[(i + 1) % 3];
            let n2 = self.nodes[(i + 2) % 3];
            (n1 == a && n2 == b) || (n1 == b && n2 == a)
        })
    }

    /// True if slot `i` is on the mesh boundary
    #[inline]
    pub fn is_boundary(&self, i: usize) -> bool {
        self.neighbours[i].is_none()
    }
}

/// A 2D piecewise-affine mesh transform
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshTransform {
    pub(crate) nodes: Vec<Node>,
    pub(crate) elements: Vec<Element>,
    pub(crate) live_nodes: usize,
    pub(crate) live_elements: usize,
}

impl MeshTransform {
    /// Empty mesh with room for the given numbers of nodes and elements
    pub fn new(node_capacity: usize, elem_capacity: usize) -> Result<Self> {
        let mut nodes = Vec::new();
        nodes.try_reserve_exact(node_capacity)?;
        let mut elements = Vec::new();
        elements.try_reserve_exact(elem_capacity)?;
        Ok(Self {
            nodes,
            elements,
            live_nodes: 0,
            live_elements: 0,
        })
    }

    /// Build a mesh from node positions and counter-clockwise triangles,
    /// wiring neighbours through shared edges.
    pub fn from_triangles(
        positions: &[Point2d],
        triangles: &[[usize; 3]],
        origin: NodeOrigin,
    ) -> Result<Self> {
        let mut mesh = Self::new(positions.len(), triangles.len())?;
        for p in positions {
            mesh.push_node(Node::new(*p, origin))?;
        }
        let mut edge_map: HashMap<(usize, usize), (usize, usize)> =
            HashMap::with_capacity(triangles.len() * 3);
        for tri in triangles {
            if tri.iter().any(|&n| n >= positions.len()) {
                return Err(Error::DomainData(format!(
                    "Triangle {:?} references a missing node",
                    tri
                )));
            }
            let e = mesh.push_element(*tri)?;
            for i in 0..3 {
                let a = tri[(i + 1) % 3];
                let b = tri[(i + 2) % 3];
                if edge_map.insert((a, b), (e, i)).is_some() {
                    return Err(Error::DomainData(format!(
                        "Edge ({}, {}) is used twice with the same direction",
                        a, b
                    )));
                }
            }
        }
        for (&(a, b), &(e, i)) in &edge_map {
            if let Some(&(twin, _)) = edge_map.get(&(b, a)) {
                mesh.elements[e].neighbours[i] = Some(twin);
            }
        }
        Ok(mesh)
    }

    /// Deep copy with dead nodes and elements squeezed out
    pub fn copy_squeezed(&self) -> Result<Self> {
        let mut copy = Self::new(self.live_nodes, self.live_elements)?;
        copy.nodes.extend(self.nodes.iter().copied());
        copy.elements.extend(self.elements.iter().copied());
        copy.live_nodes = self.live_nodes;
        copy.live_elements = self.live_elements;
        copy.squeeze()?;
        Ok(copy)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn node(&self, idx: usize) -> Option<&Node> {
        self.nodes.get(idx)
    }

    pub fn element(&self, idx: usize) -> Option<&Element> {
        self.elements.get(idx)
    }

    /// Number of nodes that are not deleted
    pub fn node_count(&self) -> usize {
        self.live_nodes
    }

    /// Number of elements that are not zombies
    pub fn element_count(&self) -> usize {
        self.live_elements
    }

    /// Indices of the live elements
    pub fn live_elements(&self) -> impl Iterator<Item = usize> + '_ {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.zombie)
            .map(|(i, _)| i)
    }

    pub fn push_node(&mut self, node: Node) -> Result<usize> {
        self.nodes.try_reserve(1)?;
        self.nodes.push(node);
        if !node.deleted {
            self.live_nodes += 1;
        }
        Ok(self.nodes.len() - 1)
    }

    /// Append an element with no neighbours
    pub fn push_element(&mut self, nodes: [usize; 3]) -> Result<usize> {
        self.elements.try_reserve(1)?;
        let idx = self.elements.len();
        self.elements.push(Element::new(idx, nodes));
        self.live_elements += 1;
        Ok(idx)
    }

    /// Set one neighbour slot without touching the neighbour itself
    pub fn set_neighbour(&mut self, elem: usize, slot: usize, nbr: Option<usize>) -> Result<()> {
        let e = self
            .elements
            .get_mut(elem)
            .ok_or_else(|| Error::DomainData(format!("No element {}", elem)))?;
        if slot > 2 {
            return Err(Error::ParamData(format!("Neighbour slot {} out of range", slot)));
        }
        e.neighbours[slot] = nbr;
        Ok(())
    }

    pub fn set_displacement(&mut self, node: usize, displacement: Vector2d) -> Result<()> {
        let n = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| Error::DomainData(format!("No node {}", node)))?;
        n.displacement = displacement;
        Ok(())
    }

    /// Mutable access to every live node's displacement, with its rest position
    pub fn displacements_mut(&mut self) -> impl Iterator<Item = (Point2d, &mut Vector2d)> + '_ {
        self.nodes
            .iter_mut()
            .filter(|n| !n.deleted)
            .map(|n| (n.position, &mut n.displacement))
    }

    /// Source triangle of an element
    #[inline]
    pub fn source_triangle(&self, elem: usize) -> [Point2d; 3] {
        let e = &self.elements[elem];
        [
            self.nodes[e.nodes[0]].position,
            self.nodes[e.nodes[1]].position,
            self.nodes[e.nodes[2]].position,
        ]
    }

    /// Displaced triangle of an element
    #[inline]
    pub fn displaced_triangle(&self, elem: usize) -> [Point2d; 3] {
        let e = &self.elements[elem];
        [
            self.nodes[e.nodes[0]].displaced(),
            self.nodes[e.nodes[1]].displaced(),
            self.nodes[e.nodes[2]].displaced(),
        ]
    }

    /// Signed double-area of an element's source triangle
    pub fn source_area2(&self, elem: usize) -> f64 {
        let [p0, p1, p2] = self.source_triangle(elem);
        signed_area2(&p0, &p1, &p2)
    }

    /// Signed double-area of an element's displaced triangle
    pub fn displaced_area2(&self, elem: usize) -> f64 {
        let [p0, p1, p2] = self.displaced_triangle(elem);
        signed_area2(&p0, &p1, &p2)
    }

    /// First live element at or after `hint`, wrapping round
    pub(crate) fn live_start(&self, hint: usize) -> Option<usize> {
        let n = self.elements.len();
        (0..n)
            .map(|k| (hint + k) % n)
            .find(|&e| !self.elements[e].zombie)
    }

    /// Walk from `start` through neighbours to the element whose source
    /// triangle contains `p`.
    ///
    /// At each element the sub-areas opposite vertices 0, 1 and 2 are tested
    /// in that order and the walk steps across the first edge `p` lies
    /// beyond. Reaching a boundary edge means `p` is outside the mesh.
    pub fn walk(&self, start: usize, p: &Point2d) -> Result<usize> {
        let mut e = self
            .live_start(start)
            .ok_or_else(|| Error::DomainData("Mesh has no live elements".to_string()))?;
        let max_steps = 4 * self.elements.len() + 16;
        for _ in 0..max_steps {
            let elm = &self.elements[e];
            if elm.zombie {
                return Err(Error::DomainData(format!("Walk reached dead element {}", e)));
            }
            let [p0, p1, p2] = self.source_triangle(e);
            let area = signed_area2(&p0, &p1, &p2);
            if area < MESH_TOLERANCE_SQ {
                return Err(Error::DomainData(format!("Element {} is degenerate", e)));
            }
            let a0 = signed_area2(&p1, &p2, p);
            let slot = if a0 < -MESH_TOLERANCE_SQ {
                0
            } else {
                let a1 = signed_area2(&p2, &p0, p);
                if a1 < -MESH_TOLERANCE_SQ {
                    1
                } else if area - a0 - a1 < -MESH_TOLERANCE_SQ {
                    2
                } else {
                    return Ok(e);
                }
            };
            e = elm.neighbours[slot].ok_or_else(|| {
                Error::DomainData(format!("Point ({}, {}) is outside the mesh", p.x, p.y))
            })?;
        }
        Err(Error::DomainData(format!(
            "Walk to ({}, {}) did not terminate",
            p.x, p.y
        )))
    }

    /// Compact the arrays, dropping deleted nodes and zombie elements and
    /// renumbering every node, element and neighbour reference.
    pub fn squeeze(&mut self) -> Result<()> {
        let mut node_map: Vec<Option<usize>> = Vec::new();
        node_map.try_reserve_exact(self.nodes.len())?;
        let mut next = 0;
        for n in &self.nodes {
            if n.deleted {
                node_map.push(None);
            } else {
                node_map.push(Some(next));
                next += 1;
            }
        }
        let mut elem_map: Vec<Option<usize>> = Vec::new();
        elem_map.try_reserve_exact(self.elements.len())?;
        let mut next = 0;
        for e in &self.elements {
            if e.zombie {
                elem_map.push(None);
            } else {
                elem_map.push(Some(next));
                next += 1;
            }
        }

        let mut elements = Vec::new();
        elements.try_reserve_exact(next)?;
        for (old, e) in self.elements.iter().enumerate() {
            let Some(new_idx) = elem_map[old] else {
                continue;
            };
            let mut nodes = [0usize; 3];
            for (dst, &src) in nodes.iter_mut().zip(e.nodes.iter()) {
                *dst = node_map.get(src).copied().flatten().ok_or_else(|| {
                    Error::DomainData(format!(
                        "Element {} references deleted node {}",
                        old, src
                    ))
                })?;
            }
            let mut neighbours = [None; 3];
            for (dst, src) in neighbours.iter_mut().zip(e.neighbours.iter()) {
                *dst = src.and_then(|n| elem_map.get(n).copied().flatten());
            }
            elements.push(Element {
                id: new_idx,
                nodes,
                neighbours,
                zombie: false,
            });
        }
        self.nodes.retain(|n| !n.deleted);
        self.elements = elements;
        self.live_nodes = self.nodes.len();
        self.live_elements = self.elements.len();
        Ok(())
    }

    /// Check every live element: node references, source area, displaced
    /// area when `check_displacement` is set, and neighbour symmetry.
    pub fn verify(&self, check_displacement: bool) -> Result<()> {
        for (idx, elm) in self.elements.iter().enumerate() {
            if elm.zombie {
                continue;
            }
            let fail = |kind| Err(Error::Mesh { element: idx, kind });
            if elm.id != idx {
                return fail(MeshErrorKind::ElemIndex);
            }
            let [n0, n1, n2] = elm.nodes;
            if n0 == n1
                || n1 == n2
                || n2 == n0
                || elm
                    .nodes
                    .iter()
                    .any(|&n| self.nodes.get(n).map_or(true, |node| node.deleted))
            {
                return fail(MeshErrorKind::ElemNode);
            }
            if check_displacement && self.displaced_area2(idx) < MESH_TOLERANCE_SQ {
                return fail(MeshErrorKind::DElemCw);
            }
            if self.source_area2(idx) < MESH_TOLERANCE_SQ {
                return fail(MeshErrorKind::ElemCw);
            }
            for slot in 0..3 {
                let Some(nbr) = elm.neighbours[slot] else {
                    continue;
                };
                let Some(other) = self.elements.get(nbr) else {
                    return fail(MeshErrorKind::NElemIndex);
                };
                if other.zombie {
                    return fail(MeshErrorKind::NElemZombie);
                }
                let a = elm.nodes[(slot + 1) % 3];
                let b = elm.nodes[(slot + 2) % 3];
                let Some(back) = other.edge_slot(a, b) else {
                    return fail(MeshErrorKind::NElemNode);
                };
                if other.neighbours[back] != Some(idx) {
                    return fail(MeshErrorKind::NElemNotNbr);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Unit grid of `size` x `size` nodes split into counter-clockwise triangles
    pub(crate) fn make_grid(size: usize, step: f64) -> MeshTransform {
        let mut positions = Vec::new();
        for y in 0..size {
            for x in 0..size {
                positions.push(Point2d::new(x as f64 * step, y as f64 * step));
            }
        }
        let mut triangles = Vec::new();
        for y in 0..(size - 1) {
            for x in 0..(size - 1) {
                let bl = y * size + x;
                let br = bl + 1;
                let tl = bl + size;
                let tr = tl + 1;
                triangles.push([bl, br, tl]);
                triangles.push([tr, tl, br]);
            }
        }
        MeshTransform::from_triangles(&positions, &triangles, NodeOrigin::Block).unwrap()
    }

    pub(crate) fn make_single_triangle() -> MeshTransform {
        MeshTransform::from_triangles(
            &[
                Point2d::new(0.0, 0.0),
                Point2d::new(10.0, 0.0),
                Point2d::new(0.0, 10.0),
            ],
            &[[0, 1, 2]],
            NodeOrigin::Block,
        )
        .unwrap()
    }

    #[test]
    fn test_from_triangles_links_neighbours() {
        let mesh = make_grid(3, 1.0);
        assert_eq!(mesh.node_count(), 9);
        assert_eq!(mesh.element_count(), 8);
        // Diagonal of the first cell
        assert_eq!(mesh.elements()[0].neighbours[0], Some(1));
        assert_eq!(mesh.elements()[1].neighbours[0], Some(0));
        mesh.verify(true).unwrap();
    }

    #[test]
    fn test_verify_detects_clockwise_element() {
        let mesh = MeshTransform::from_triangles(
            &[
                Point2d::new(0.0, 0.0),
                Point2d::new(0.0, 10.0),
                Point2d::new(10.0, 0.0),
            ],
            &[[0, 1, 2]],
            NodeOrigin::Block,
        )
        .unwrap();
        assert_eq!(
            mesh.verify(false),
            Err(Error::Mesh {
                element: 0,
                kind: MeshErrorKind::ElemCw
            })
        );
    }

    #[test]
    fn test_verify_detects_displaced_fold() {
        let mut mesh = make_single_triangle();
        mesh.set_displacement(1, Vector2d::new(-20.0, 0.0)).unwrap();
        mesh.verify(false).unwrap();
        assert_eq!(
            mesh.verify(true),
            Err(Error::Mesh {
                element: 0,
                kind: MeshErrorKind::DElemCw
            })
        );
    }

    #[test]
    fn test_verify_detects_asymmetry() {
        let mut mesh = make_grid(2, 1.0);
        mesh.set_neighbour(1, 0, None).unwrap();
        assert_eq!(
            mesh.verify(false),
            Err(Error::Mesh {
                element: 0,
                kind: MeshErrorKind::NElemNotNbr
            })
        );
    }

    #[test]
    fn test_squeeze_renumbers() {
        let mut mesh = make_grid(3, 1.0);
        // Drop the last cell and its now unused corner node
        mesh.elements[6].zombie = true;
        mesh.elements[7].zombie = true;
        mesh.live_elements -= 2;
        for e in 0..6 {
            for slot in 0..3 {
                if matches!(mesh.elements[e].neighbours[slot], Some(6) | Some(7)) {
                    mesh.elements[e].neighbours[slot] = None;
                }
            }
        }
        mesh.nodes[8].deleted = true;
        mesh.live_nodes -= 1;
        mesh.squeeze().unwrap();
        assert_eq!(mesh.nodes().len(), 8);
        assert_eq!(mesh.elements().len(), 6);
        assert!(mesh.elements().iter().enumerate().all(|(i, e)| e.id == i));
        mesh.verify(true).unwrap();
    }

    #[test]
    fn test_copy_squeezed_leaves_original() {
        let mut mesh = make_grid(2, 1.0);
        mesh.elements[1].zombie = true;
        mesh.live_elements -= 1;
        mesh.elements[0].neighbours[0] = None;
        let copy = mesh.copy_squeezed().unwrap();
        assert_eq!(copy.elements().len(), 1);
        assert_eq!(mesh.elements().len(), 2);
    }

    #[test]
    fn test_walk_finds_element() {
        let mesh = make_grid(4, 10.0);
        let p = Point2d::new(25.0, 27.0);
        let e = mesh.walk(0, &p).unwrap();
        let [a, b, c] = mesh.source_triangle(e);
        assert!(signed_area2(&a, &b, &p) >= -MESH_TOLERANCE_SQ);
        assert!(signed_area2(&b, &c, &p) >= -MESH_TOLERANCE_SQ);
        assert!(signed_area2(&c, &a, &p) >= -MESH_TOLERANCE_SQ);
    }

    #[test]
    fn test_walk_outside_fails() {
        let mesh = make_grid(3, 1.0);
        assert!(matches!(
            mesh.walk(0, &Point2d::new(5.0, 0.5)),
            Err(Error::DomainData(_))
        ));
    }

    #[test]
    fn test_areas() {
        let mesh = make_single_triangle();
        assert_relative_eq!(mesh.source_area2(0), 100.0);
        assert_relative_eq!(mesh.displaced_area2(0), 100.0);
    }
}
