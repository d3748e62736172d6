//! Local re-triangulation: node insertion and node deletion
//!
//! Insertion is incremental Bowyer-Watson: the elements whose circumcircles
//! contain the new point are removed and the cavity is refilled with a fan
//! around the point. Deletion removes the fan of elements around a node and
//! fills the hole by ear clipping, always taking the ear whose circumcircle
//! has the least power with respect to the removed node.

use crate::error::{Error, Result};
use crate::mesh::{Element, MeshTransform, Node, NodeOrigin};
use crate::point::{
    circumcircle, distance_sq, in_circumcircle, signed_area2, Point2d, MESH_ELEM_AREA_TOLERANCE,
    MESH_TOLERANCE_SQ,
};
use log::trace;
use priority_queue::PriorityQueue;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Outcome of inserting a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeInsert {
    /// The node was added and `element` is one of the elements using it
    Inserted { node: usize, element: usize },
    /// The point coincides with `node`, which takes the new origin
    Existing { node: usize, element: usize },
    /// The point was too close to an existing node
    Rejected,
    /// The cavity around the point is not star-shaped from it, so the
    /// fan would fold or pinch the mesh
    Degenerate,
    /// The point is not covered by the mesh
    Outside,
}

#[derive(Debug, Clone, Copy)]
struct EarPower {
    power: f64,
    pos: usize,
}

impl PartialEq for EarPower {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EarPower {}

impl PartialOrd for EarPower {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EarPower {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: least power first, then earliest chain position
        other
            .power
            .total_cmp(&self.power)
            .then_with(|| other.pos.cmp(&self.pos))
    }
}

/// Boundary of the hole left by a node's fan, walked counter-clockwise
/// around the node. Each chain edge `i -> next[i]` remembers the element
/// on its far side.
struct HoleChain {
    nodes: Vec<usize>,
    edge_nbr: Vec<Option<usize>>,
    prev: Vec<usize>,
    next: Vec<usize>,
    alive: Vec<bool>,
    closed: bool,
}

impl HoleChain {
    fn new(nodes: Vec<usize>, edge_nbr: Vec<Option<usize>>, closed: bool) -> Self {
        let n = nodes.len();
        let (prev, next) = if closed {
            (
                (0..n).map(|i| (i + n - 1) % n).collect(),
                (0..n).map(|i| (i + 1) % n).collect(),
            )
        } else {
            (
                (0..n).map(|i| i.saturating_sub(1)).collect(),
                (0..n).map(|i| (i + 1).min(n - 1)).collect(),
            )
        };
        Self {
            nodes,
            edge_nbr,
            prev,
            next,
            alive: vec![true; n],
            closed,
        }
    }

    /// Whether chain position `i` can be the middle vertex of an ear
    fn can_clip(&self, i: usize) -> bool {
        self.alive[i] && (self.closed || (i != 0 && i != self.nodes.len() - 1))
    }
}

impl MeshTransform {
    /// Set the neighbour of `elem` across edge `(a, b)`
    fn link(&mut self, elem: usize, a: usize, b: usize, nbr: Option<usize>) -> Result<()> {
        let e = &mut self.elements[elem];
        let slot = e.edge_slot(a, b).ok_or_else(|| {
            Error::DomainData(format!("Element {} has no edge ({}, {})", elem, a, b))
        })?;
        e.neighbours[slot] = nbr;
        Ok(())
    }

    fn contains_source_point(&self, elem: usize, p: &Point2d) -> bool {
        let [p0, p1, p2] = self.source_triangle(elem);
        signed_area2(&p1, &p2, p) >= -MESH_TOLERANCE_SQ
            && signed_area2(&p2, &p0, p) >= -MESH_TOLERANCE_SQ
            && signed_area2(&p0, &p1, p) >= -MESH_TOLERANCE_SQ
    }

    /// Element whose source triangle contains `p`, walking from `hint` and
    /// falling back to an exhaustive search.
    pub fn find_element(&self, hint: usize, p: &Point2d) -> Option<usize> {
        if let Ok(e) = self.walk(hint, p) {
            return Some(e);
        }
        self.live_elements()
            .find(|&e| self.source_area2(e) >= MESH_TOLERANCE_SQ && self.contains_source_point(e, p))
    }

    /// Insert a node at `position`.
    ///
    /// A point on an existing node only relabels that node's origin. The
    /// point is dropped when a node of the re-triangulated region, other than
    /// a bounding box corner, is closer than `min_dist`.
    pub fn add_node(
        &mut self,
        elem_hint: usize,
        position: Point2d,
        min_dist: f64,
        origin: NodeOrigin,
    ) -> Result<NodeInsert> {
        let Some(start) = self.find_element(elem_hint, &position) else {
            return Ok(NodeInsert::Outside);
        };

        let coincident = self.elements[start]
            .nodes
            .into_iter()
            .find(|&n| distance_sq(&self.nodes[n].position, &position) < MESH_TOLERANCE_SQ);
        if let Some(node) = coincident {
            self.nodes[node].origin = origin;
            return Ok(NodeInsert::Existing {
                node,
                element: start,
            });
        }

        // Conflict region: elements whose circumcircle holds the point
        let mut in_conflict = vec![false; self.elements.len()];
        let mut conflict = vec![start];
        in_conflict[start] = true;
        let mut stack = vec![start];
        while let Some(e) = stack.pop() {
            for nbr in self.elements[e].neighbours.into_iter().flatten() {
                if in_conflict[nbr] || self.elements[nbr].zombie {
                    continue;
                }
                let [p0, p1, p2] = self.source_triangle(nbr);
                if in_circumcircle(&p0, &p1, &p2, &position) {
                    in_conflict[nbr] = true;
                    conflict.push(nbr);
                    stack.push(nbr);
                }
            }
        }

        let min_dist_sq = min_dist * min_dist;
        for &e in &conflict {
            for &n in &self.elements[e].nodes {
                let node = &self.nodes[n];
                let d2 = distance_sq(&node.position, &position);
                if d2 < MESH_TOLERANCE_SQ
                    || (node.origin != NodeOrigin::BoundingBox && d2 < min_dist_sq)
                {
                    trace!(
                        "Rejecting node ({}, {}): too close to node {}",
                        position.x,
                        position.y,
                        n
                    );
                    return Ok(NodeInsert::Rejected);
                }
            }
        }

        // Cavity boundary edges, directed counter-clockwise round the cavity
        let mut edges: Vec<(usize, usize, Option<usize>)> = Vec::new();
        for &e in &conflict {
            let elm = &self.elements[e];
            for slot in 0..3 {
                let outer = elm.neighbours[slot].filter(|&n| !in_conflict[n]);
                if elm.neighbours[slot].is_some() && outer.is_none() {
                    continue;
                }
                let a = elm.nodes[(slot + 1) % 3];
                let b = elm.nodes[(slot + 2) % 3];
                let area = signed_area2(&self.nodes[a].position, &self.nodes[b].position, &position);
                if area > MESH_ELEM_AREA_TOLERANCE {
                    edges.push((a, b, outer));
                } else if outer.is_some() || area < -MESH_TOLERANCE_SQ {
                    return Ok(NodeInsert::Degenerate);
                }
                // Otherwise the point lies on this boundary edge, which is dropped
            }
        }
        let mut by_start: HashMap<usize, usize> = HashMap::with_capacity(edges.len());
        let mut by_end: HashMap<usize, usize> = HashMap::with_capacity(edges.len());
        for (k, &(a, b, _)) in edges.iter().enumerate() {
            if by_start.insert(a, k).is_some() || by_end.insert(b, k).is_some() {
                return Ok(NodeInsert::Degenerate);
            }
        }

        self.nodes.try_reserve(1)?;
        let new_node = self.nodes.len();
        self.nodes.push(Node::new(position, origin));
        self.live_nodes += 1;

        // Element slot for every cavity edge, reusing the conflict slots first
        let extra = edges.len().saturating_sub(conflict.len());
        self.elements.try_reserve(extra)?;
        let mut slots = Vec::with_capacity(edges.len());
        for k in 0..edges.len() {
            if let Some(&e) = conflict.get(k) {
                slots.push(e);
            } else {
                let idx = self.elements.len();
                let mut placeholder = Element::new(idx, [0; 3]);
                placeholder.zombie = true;
                self.elements.push(placeholder);
                slots.push(idx);
            }
        }
        for &e in conflict.iter().skip(edges.len()) {
            let elm = &mut self.elements[e];
            elm.zombie = true;
            elm.neighbours = [None; 3];
            self.live_elements -= 1;
        }
        for (k, &(a, b, outer)) in edges.iter().enumerate() {
            let e = slots[k];
            let was_zombie = self.elements[e].zombie;
            self.elements[e] = Element {
                id: e,
                nodes: [a, b, new_node],
                neighbours: [
                    by_start.get(&b).map(|&j| slots[j]),
                    by_end.get(&a).map(|&j| slots[j]),
                    outer,
                ],
                zombie: false,
            };
            if was_zombie {
                self.live_elements += 1;
            }
        }
        for (k, &(a, b, outer)) in edges.iter().enumerate() {
            if let Some(o) = outer {
                self.link(o, a, b, Some(slots[k]))?;
            }
        }
        trace!(
            "Inserted node {} at ({}, {}) replacing {} elements with {}",
            new_node,
            position.x,
            position.y,
            conflict.len(),
            edges.len()
        );
        let element = slots.first().copied().ok_or_else(|| {
            Error::DomainData("Insertion produced no elements".to_string())
        })?;
        Ok(NodeInsert::Inserted {
            node: new_node,
            element,
        })
    }

    /// Some live element using `node`, trying `hint` and a walk to the
    /// node's position before a full search.
    fn element_using(&self, hint: usize, node: usize) -> Option<usize> {
        let uses = |e: usize| {
            self.elements
                .get(e)
                .is_some_and(|elm| !elm.zombie && elm.local_index(node).is_some())
        };
        if uses(hint) {
            return Some(hint);
        }
        if let Ok(e) = self.walk(hint, &self.nodes[node].position) {
            if uses(e) {
                return Some(e);
            }
        }
        self.live_elements().find(|&e| uses(e))
    }

    /// Elements around `node` in counter-clockwise order and whether they
    /// close into a ring.
    fn node_fan(&self, start: usize, node: usize) -> Result<(Vec<usize>, bool)> {
        let limit = self.elements.len() + 1;
        let local = |e: usize| -> Result<usize> {
            let elm = &self.elements[e];
            if elm.zombie {
                return Err(Error::DomainData(format!(
                    "Node {} is used by dead element {}",
                    node, e
                )));
            }
            elm.local_index(node).ok_or_else(|| {
                Error::DomainData(format!("Element {} does not use node {}", e, node))
            })
        };

        // Turn clockwise to the boundary, or all the way round
        let mut first = start;
        let mut closed = false;
        for _ in 0..limit {
            let j = local(first)?;
            match self.elements[first].neighbours[(j + 2) % 3] {
                Some(n) if n == start => {
                    closed = true;
                    break;
                }
                Some(n) => first = n,
                None => break,
            }
        }

        let mut fan = vec![first];
        let mut e = first;
        loop {
            if fan.len() > limit {
                return Err(Error::DomainData(format!(
                    "Fan round node {} does not close",
                    node
                )));
            }
            let j = local(e)?;
            match self.elements[e].neighbours[(j + 1) % 3] {
                Some(n) if n == first => {
                    if !closed {
                        return Err(Error::DomainData(format!(
                            "Fan round node {} is inconsistent",
                            node
                        )));
                    }
                    break;
                }
                Some(n) => {
                    if fan.contains(&n) {
                        return Err(Error::DomainData(format!(
                            "Fan round node {} revisits element {}",
                            node, n
                        )));
                    }
                    fan.push(n);
                    e = n;
                }
                None => {
                    if closed {
                        return Err(Error::DomainData(format!(
                            "Fan round node {} is inconsistent",
                            node
                        )));
                    }
                    break;
                }
            }
        }
        Ok((fan, closed))
    }

    fn ear_power(&self, chain: &HoleChain, i: usize, centre: &Point2d) -> Option<f64> {
        let a = &self.nodes[chain.nodes[chain.prev[i]]].position;
        let b = &self.nodes[chain.nodes[i]].position;
        let c = &self.nodes[chain.nodes[chain.next[i]]].position;
        if signed_area2(a, b, c) <= MESH_ELEM_AREA_TOLERANCE
            || signed_area2(a, c, centre) < -MESH_TOLERANCE_SQ
        {
            return None;
        }
        let (cc, r2) = circumcircle(a, b, c)?;
        Some(distance_sq(&cc, centre) - r2)
    }

    /// Create the element for the ear at chain position `i` in slot `slot`
    /// and splice `i` out of the chain.
    fn clip_ear(&mut self, chain: &mut HoleChain, i: usize, slot: usize) -> Result<()> {
        let p = chain.prev[i];
        let n = chain.next[i];
        let (na, nb, nc) = (chain.nodes[p], chain.nodes[i], chain.nodes[n]);
        let nbr_bc = chain.edge_nbr[i];
        let nbr_ab = chain.edge_nbr[p];
        self.place_element(slot, [na, nb, nc], [nbr_bc, None, nbr_ab])?;
        chain.edge_nbr[p] = Some(slot);
        chain.next[p] = n;
        chain.prev[n] = p;
        chain.alive[i] = false;
        Ok(())
    }

    /// Overwrite element `slot` and point its neighbours back at it
    fn place_element(
        &mut self,
        slot: usize,
        nodes: [usize; 3],
        neighbours: [Option<usize>; 3],
    ) -> Result<()> {
        if self.elements[slot].zombie {
            self.live_elements += 1;
        }
        self.elements[slot] = Element {
            id: slot,
            nodes,
            neighbours,
            zombie: false,
        };
        for k in 0..3 {
            if let Some(nbr) = neighbours[k] {
                self.link(nbr, nodes[(k + 1) % 3], nodes[(k + 2) % 3], Some(slot))?;
            }
        }
        Ok(())
    }

    /// Delete a node, removing every element that uses it and
    /// re-triangulating the hole. A boundary node leaves the mesh boundary
    /// running along the far edges of its fan wherever no valid ear exists.
    pub fn delete_node(&mut self, elem_hint: usize, node: usize) -> Result<()> {
        let centre = match self.nodes.get(node) {
            Some(n) if !n.deleted => n.position,
            Some(_) => return Ok(()),
            None => return Err(Error::DomainData(format!("No node {}", node))),
        };
        let Some(start) = self.element_using(elem_hint, node) else {
            self.nodes[node].deleted = true;
            self.live_nodes -= 1;
            return Ok(());
        };
        let (fan, closed) = self.node_fan(start, node)?;

        let mut chain_nodes = Vec::with_capacity(fan.len() + 1);
        let mut edge_nbr = Vec::with_capacity(fan.len() + 1);
        for &e in &fan {
            let elm = &self.elements[e];
            let j = elm
                .local_index(node)
                .ok_or_else(|| Error::DomainData(format!("Element {} lost node {}", e, node)))?;
            let outer = elm.neighbours[j];
            if outer.is_some_and(|o| fan.contains(&o)) {
                return Err(Error::DomainData(format!(
                    "Fan round node {} folds onto itself",
                    node
                )));
            }
            chain_nodes.push(elm.nodes[(j + 1) % 3]);
            edge_nbr.push(outer);
        }
        if !closed {
            let last = self.elements[fan[fan.len() - 1]];
            let j = last.local_index(node).unwrap_or(0);
            chain_nodes.push(last.nodes[(j + 2) % 3]);
            edge_nbr.push(None);
        }
        let mut sorted = chain_nodes.clone();
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(Error::DomainData(format!(
                "Hole round node {} is not simple",
                node
            )));
        }

        // Release the fan; its slots are refilled below
        for &e in &fan {
            let elm = &mut self.elements[e];
            elm.zombie = true;
            elm.neighbours = [None; 3];
            self.live_elements -= 1;
        }
        let mut free = fan.clone();
        free.reverse();

        let mut chain = HoleChain::new(chain_nodes, edge_nbr, closed);
        let mut remaining = chain.nodes.len();
        let mut queue: PriorityQueue<usize, EarPower> = PriorityQueue::new();
        for i in 0..chain.nodes.len() {
            if chain.can_clip(i) {
                if let Some(power) = self.ear_power(&chain, i, &centre) {
                    queue.push(i, EarPower { power, pos: i });
                }
            }
        }
        while !(closed && remaining <= 3) {
            let Some((i, _)) = queue.pop() else {
                break;
            };
            let slot = free.pop().ok_or_else(|| {
                Error::DomainData(format!("Ran out of element slots deleting node {}", node))
            })?;
            self.clip_ear(&mut chain, i, slot)?;
            remaining -= 1;
            for k in [chain.prev[i], chain.next[i]] {
                match chain
                    .can_clip(k)
                    .then(|| self.ear_power(&chain, k, &centre))
                    .flatten()
                {
                    Some(power) => {
                        queue.push(k, EarPower { power, pos: k });
                    }
                    None => {
                        queue.remove(&k);
                    }
                }
            }
        }

        if closed {
            if remaining != 3 {
                return Err(Error::DomainData(format!(
                    "No valid ear left deleting node {}",
                    node
                )));
            }
            let i0 = (0..chain.nodes.len())
                .find(|&i| chain.alive[i])
                .ok_or_else(|| Error::DomainData("Empty hole".to_string()))?;
            let i1 = chain.next[i0];
            let i2 = chain.next[i1];
            let tri = [chain.nodes[i0], chain.nodes[i1], chain.nodes[i2]];
            let area = signed_area2(
                &self.nodes[tri[0]].position,
                &self.nodes[tri[1]].position,
                &self.nodes[tri[2]].position,
            );
            if area <= MESH_ELEM_AREA_TOLERANCE {
                return Err(Error::DomainData(format!(
                    "Deleting node {} leaves a degenerate element",
                    node
                )));
            }
            let slot = free.pop().ok_or_else(|| {
                Error::DomainData(format!("Ran out of element slots deleting node {}", node))
            })?;
            self.place_element(
                slot,
                tri,
                [chain.edge_nbr[i1], chain.edge_nbr[i2], chain.edge_nbr[i0]],
            )?;
        } else {
            // Edges never clipped become mesh boundary
            let mut i = 0;
            while i != chain.nodes.len() - 1 {
                let n = chain.next[i];
                if let Some(nbr) = chain.edge_nbr[i] {
                    self.link(nbr, chain.nodes[i], chain.nodes[n], None)?;
                }
                i = n;
            }
        }

        self.nodes[node].deleted = true;
        self.live_nodes -= 1;
        trace!(
            "Deleted node {} and {} elements, {} reused",
            node,
            fan.len(),
            fan.len() - free.len()
        );
        Ok(())
    }

    /// Delete several nodes in turn
    pub fn delete_nodes(&mut self, elem_hint: usize, nodes: &[usize]) -> Result<()> {
        for &n in nodes {
            self.delete_node(elem_hint, n)?;
        }
        Ok(())
    }
}
