//! Boundary-conforming meshes refined by image gradient

use crate::bbox::{mesh_from_obj_box, remove_box_nodes};
use crate::boundary::fix_boundary_polygon;
use crate::image::{ScalarImage, ThresholdSide};
use crate::morphology::{convex_hull, disc_dilation};
use log::debug;
use meshwarp_core::{
    Error, MeshTransform, Object, PolygonDomain, Result, Vector2d, VertexKind,
};

/// Build a mesh whose boundary follows the convex hull of the object and
/// whose interior nodes are spaced `min_dist` apart where the grey values
/// change quickly and `max_dist` apart where they are flat.
///
/// `min_dist` is clamped to at least 2 and `max_dist` to at least
/// `min_dist`. Objects without values are filled at `max_dist`.
pub fn mesh_from_obj_gradient(obj: &Object, min_dist: i32, max_dist: i32) -> Result<MeshTransform> {
    let min_dist = min_dist.max(2);
    let max_dist = max_dist.max(min_dist);
    let dom_obj = obj.as_domain_2d()?;

    let (mut mesh, _) = mesh_from_obj_box(obj, max_dist * 4)?;

    let dilated = disc_dilation(&dom_obj.domain, min_dist)?;
    let hull = convex_hull(&dilated);
    if hull.len() < 3 {
        return Err(Error::DomainData(format!(
            "Convex hull of the object has only {} vertices",
            hull.len()
        )));
    }
    let boundary = fix_boundary_polygon(&hull, min_dist as f64)?;
    let n_boundary = mesh.add_polygon(
        &PolygonDomain::new(VertexKind::Double, boundary),
        min_dist as f64,
    )?;
    remove_box_nodes(&mut mesh)?;
    mesh.squeeze()?;

    let image = ScalarImage::from_domain_object(dom_obj)?.laplacian_magnitude();
    let fine = (min_dist / 5 + 1) as usize;
    let coarse = (max_dist / 5 + 1) as usize;
    let mut n_interior = 0;
    let thr = match image.range() {
        Some((g_min, g_max)) if g_max > g_min => Some(g_min + (g_max - g_min) / 4.0),
        _ => None,
    };
    if let Some(thr) = thr {
        let high = image.sample_min(fine).threshold(thr, ThresholdSide::High);
        n_interior += mesh.add_domain_points(
            &high,
            min_dist as f64,
            Vector2d::new(fine as f64, fine as f64),
        )?;
    }
    let low = image
        .sample_min(coarse)
        .threshold(thr.unwrap_or(f64::INFINITY), ThresholdSide::Low);
    n_interior += mesh.add_domain_points(
        &low,
        max_dist as f64,
        Vector2d::new(coarse as f64, coarse as f64),
    )?;
    mesh.squeeze()?;

    debug!(
        "Gradient mesh: {} boundary and {} interior nodes, {} elements (spacing {}..{})",
        n_boundary,
        n_interior,
        mesh.element_count(),
        min_dist,
        max_dist
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshwarp_core::{
        DomainObject, GreyRaster, GreyValue, IntervalDomain, NodeOrigin, Point2d, Point2i,
        ValueTable,
    };
    use ndarray::Array2;

    fn assert_covers(mesh: &MeshTransform, domain: &IntervalDomain) {
        for px in domain.pixels() {
            let p = Point2d::new(px.x as f64, px.y as f64);
            assert!(mesh.find_element(0, &p).is_some(), "({}, {})", px.x, px.y);
        }
    }

    #[test]
    fn test_gradient_mesh_without_values() {
        let domain = IntervalDomain::from_rect(0, 0, 39, 29);
        let obj = Object::Domain2D(DomainObject::new(domain.clone(), None));
        let mesh = mesh_from_obj_gradient(&obj, 4, 10).unwrap();
        mesh.verify(true).unwrap();
        assert!(mesh
            .nodes()
            .iter()
            .all(|n| n.origin != NodeOrigin::BoundingBox));
        assert!(mesh
            .nodes()
            .iter()
            .any(|n| n.origin == NodeOrigin::IntervalDomain));
        assert_covers(&mesh, &domain);
    }

    #[test]
    fn test_gradient_mesh_denser_at_edge() {
        let raster = Array2::from_shape_fn((40, 40), |(_, c)| if c < 20 { 10.0 } else { 200.0 });
        let values = ValueTable::new(
            Point2i::new(0, 0),
            GreyRaster::Double(raster),
            GreyValue::Double(0.0),
        )
        .unwrap();
        let domain = IntervalDomain::from_rect(0, 0, 39, 39);
        let obj = Object::Domain2D(DomainObject::new(domain.clone(), Some(values)));
        let mesh = mesh_from_obj_gradient(&obj, 2, 12).unwrap();
        mesh.verify(true).unwrap();
        assert_covers(&mesh, &domain);

        let interior: Vec<Point2d> = mesh
            .nodes()
            .iter()
            .filter(|n| n.origin == NodeOrigin::IntervalDomain)
            .map(|n| n.position)
            .collect();
        let near_edge = interior.iter().filter(|p| (p.x - 20.0).abs() <= 3.0).count();
        let far_from_edge = interior.iter().filter(|p| p.x < 10.0).count();
        assert!(near_edge > far_from_edge);
    }

    #[test]
    fn test_gradient_mesh_wrong_object() {
        assert!(matches!(
            mesh_from_obj_gradient(&Object::Empty, 2, 4),
            Err(Error::ObjectType(_))
        ));
    }
}
