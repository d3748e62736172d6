//! Two-element meshes over an object's bounding box

use meshwarp_core::{
    BoundingBox2i, Error, MeshTransform, Node, NodeOrigin, Object, Point2d, Result,
};

/// Mesh of two triangles covering the object's bounding box grown by
/// `box_dilation`. Returns the mesh and the box it covers.
pub fn mesh_from_obj_box(obj: &Object, box_dilation: i32) -> Result<(MeshTransform, BoundingBox2i)> {
    let dom_obj = obj.as_domain_2d()?;
    let bbox = dom_obj
        .domain
        .bounding_box()
        .ok_or(Error::DomainNull)?
        .dilated(box_dilation);

    let mut mesh = MeshTransform::new(4, 2)?;
    let (x0, y0) = (bbox.x_min as f64, bbox.y_min as f64);
    let (x1, y1) = (bbox.x_max as f64, bbox.y_max as f64);
    for p in [
        Point2d::new(x0, y0),
        Point2d::new(x1, y0),
        Point2d::new(x0, y1),
        Point2d::new(x1, y1),
    ] {
        mesh.push_node(Node::new(p, NodeOrigin::BoundingBox))?;
    }
    let e0 = mesh.push_element([0, 1, 2])?;
    let e1 = mesh.push_element([3, 2, 1])?;
    mesh.set_neighbour(e0, 0, Some(e1))?;
    mesh.set_neighbour(e1, 0, Some(e0))?;
    Ok((mesh, bbox))
}

/// Delete the bounding box corner nodes
pub fn remove_box_nodes(mesh: &mut MeshTransform) -> Result<()> {
    let corners: Vec<usize> = mesh
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, n)| !n.deleted && n.origin == NodeOrigin::BoundingBox)
        .map(|(i, _)| i)
        .take(4)
        .collect();
    mesh.delete_nodes(0, &corners)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use meshwarp_core::{DomainObject, IntervalDomain, PolygonDomain, VertexKind};

    #[test]
    fn test_box_mesh_corners_and_area() {
        let obj = Object::Domain2D(DomainObject::new(
            IntervalDomain::from_rect(0, 0, 100, 50),
            None,
        ));
        let (mesh, bbox) = mesh_from_obj_box(&obj, 0).unwrap();
        assert_eq!(bbox.x_max, 100);
        assert_eq!(mesh.node_count(), 4);
        assert_eq!(mesh.element_count(), 2);
        assert_eq!(mesh.nodes()[3].position, Point2d::new(100.0, 50.0));
        let total: f64 = (0..2).map(|e| mesh.displaced_area2(e)).sum::<f64>() / 2.0;
        assert_relative_eq!(total, 100.0 * 50.0);
        mesh.verify(true).unwrap();
    }

    #[test]
    fn test_box_mesh_dilation() {
        let obj = Object::Domain2D(DomainObject::new(IntervalDomain::from_rect(5, 5, 9, 9), None));
        let (mesh, _) = mesh_from_obj_box(&obj, 3).unwrap();
        assert_eq!(mesh.nodes()[0].position, Point2d::new(2.0, 2.0));
        assert_eq!(mesh.nodes()[3].position, Point2d::new(12.0, 12.0));
    }

    #[test]
    fn test_box_mesh_rejects_polygon() {
        let obj = Object::Polygon(PolygonDomain::new(VertexKind::Int, vec![]));
        assert!(matches!(mesh_from_obj_box(&obj, 0), Err(Error::ObjectType(_))));
    }

    #[test]
    fn test_box_mesh_rejects_empty_domain() {
        let obj = Object::Domain2D(DomainObject::new(IntervalDomain::empty(), None));
        assert!(matches!(mesh_from_obj_box(&obj, 0), Err(Error::DomainNull)));
    }
}
