//! Integration tests for meshwarp-transform
//!
//! These tests build meshes, adapt them and apply them to points, polygons
//! and images, checking that the crates work together.

use approx::assert_relative_eq;
use meshwarp_build::{mesh_from_obj, mesh_from_obj_box, MeshGenConfig, MeshGenMethod};
use meshwarp_core::{
    DisplacementField, DomainObject, Error, GreyRaster, GreyValue, IntervalDomain, MeshTransform, NodeOrigin,
    Object, Point2d, Point2i, PolygonDomain, Transform2D, ValueTable, Vector2d, VertexKind,
};
use meshwarp_simplification::mesh_transform_adapt;
use meshwarp_transform::*;
use ndarray::Array2;

fn single_triangle() -> MeshTransform {
    let positions = [
        Point2d::new(0.0, 0.0),
        Point2d::new(10.0, 0.0),
        Point2d::new(0.0, 10.0),
    ];
    MeshTransform::from_triangles(&positions, &[[0, 1, 2]], NodeOrigin::Block).unwrap()
}

/// A ubyte image with a bright square in the middle of a dark field
fn square_image(size: i32) -> Object {
    let n = size as usize;
    let raster = Array2::from_shape_fn((n, n), |(r, c)| {
        let inner = (n / 4..3 * n / 4).contains(&r) && (n / 4..3 * n / 4).contains(&c);
        if inner {
            200u8
        } else {
            20u8
        }
    });
    let values = ValueTable::new(
        Point2i::new(0, 0),
        GreyRaster::UByte(raster),
        GreyValue::UByte(0),
    )
    .unwrap();
    Object::Domain2D(DomainObject::new(
        IntervalDomain::from_rect(0, 0, size - 1, size - 1),
        Some(values),
    ))
}

#[test]
fn test_identity_vertex() {
    let mesh = single_triangle();
    let p = mesh_transform_vertex(&mesh, &Point2d::new(2.0, 2.0)).unwrap();
    assert_relative_eq!(p.x, 2.0, epsilon = 1e-12);
    assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);
}

#[test]
fn test_displaced_centroid() {
    let mut mesh = single_triangle();
    mesh.set_displacement(1, Vector2d::new(5.0, 0.0)).unwrap();
    let c = Point2d::new(10.0 / 3.0, 10.0 / 3.0);
    let p = mesh_transform_vertex(&mesh, &c).unwrap();
    // x' = 1.5 x; y' = y
    assert_relative_eq!(p.x, 1.5 * c.x, epsilon = 1e-12);
    assert_relative_eq!(p.y, c.y, epsilon = 1e-12);
}

#[test]
fn test_box_mesh_total_area() {
    let obj = Object::Domain2D(DomainObject::new(
        IntervalDomain::from_rect(0, 0, 100, 50),
        None,
    ));
    let (mesh, _) = mesh_from_obj_box(&obj, 0).unwrap();
    assert_eq!(mesh.node_count(), 4);
    assert_eq!(mesh.element_count(), 2);
    let area: f64 = mesh.live_elements().map(|e| mesh.displaced_area2(e)).sum::<f64>() / 2.0;
    assert_relative_eq!(area, 5000.0);
}

#[test]
fn test_point_location_totality() {
    let obj = Object::Domain2D(DomainObject::new(
        IntervalDomain::from_rect(0, 0, 30, 20),
        None,
    ));
    let mesh = mesh_from_obj(&obj, &MeshGenConfig::default().with_min_dist(6.0)).unwrap();
    let mut locator = MeshLocator::new(&mesh);
    for y in 0..=20 {
        for x in 0..=30 {
            let p = Point2d::new(x as f64 + 0.25, y as f64 + 0.5);
            let e = locator.locate(&p).unwrap();
            let [a, b, c] = mesh.source_triangle(e);
            let tol = -1e-8;
            assert!(meshwarp_core::signed_area2(&b, &c, &p) >= tol);
            assert!(meshwarp_core::signed_area2(&c, &a, &p) >= tol);
            assert!(meshwarp_core::signed_area2(&a, &b, &p) >= tol);
        }
    }
    assert!(matches!(
        locator.locate(&Point2d::new(1000.0, 1000.0)),
        Err(Error::DomainData(_))
    ));
}

#[test]
fn test_scan_lines_cover_displaced_bounds() {
    let obj = Object::Domain2D(DomainObject::new(
        IntervalDomain::from_rect(0, 0, 40, 40),
        None,
    ));
    let mut mesh = mesh_from_obj(&obj, &MeshGenConfig::default().with_min_dist(8.0)).unwrap();
    mesh.set_displacements(&|p: &Point2d| Vector2d::new(0.05 * p.y, -0.03 * p.x));
    let itvs = mesh_scan_convert(&mesh).unwrap();
    let min_line = itvs.first().unwrap().line;
    let max_line = itvs.last().unwrap().line;
    let mut line = min_line;
    for itv in &itvs {
        assert!(itv.line == line || itv.line == line + 1);
        line = itv.line;
    }
    assert_eq!(line, max_line);
}

#[test]
fn test_transform_empty() {
    let mesh = single_triangle();
    let out = mesh_transform_obj(&Object::Empty, &mesh, Interpolation::Nearest).unwrap();
    assert_eq!(out, Object::Empty);
}

#[test]
fn test_transform_polygon_object() {
    let mut mesh = single_triangle();
    mesh.set_displacement(1, Vector2d::new(5.0, 0.0)).unwrap();
    let poly = PolygonDomain::new(
        VertexKind::Double,
        vec![Point2d::new(1.0, 1.0), Point2d::new(4.0, 1.0), Point2d::new(1.0, 4.0)],
    );
    let out = mesh_transform_obj(&Object::Polygon(poly), &mesh, Interpolation::Nearest).unwrap();
    let Object::Polygon(out) = out else {
        panic!("expected a polygon");
    };
    assert_relative_eq!(out.vertices[1].x, 6.0, epsilon = 1e-9);
    assert_relative_eq!(out.vertices[2].y, 4.0, epsilon = 1e-9);
}

#[test]
fn test_identity_transform_preserves_image() {
    let src = square_image(32);
    let mesh = mesh_from_obj(&src, &MeshGenConfig::default().with_min_dist(8.0)).unwrap();
    let out = mesh_transform_obj(&src, &mesh, Interpolation::Nearest).unwrap();
    let (Object::Domain2D(s), Object::Domain2D(d)) = (&src, &out) else {
        panic!("expected domain objects");
    };
    assert_eq!(d.domain, s.domain);
    for px in s.domain.pixels() {
        assert_eq!(d.grey_at(px.x, px.y), s.grey_at(px.x, px.y));
    }
}

#[test]
fn test_translated_image() {
    let src = square_image(32);
    let mut mesh = mesh_from_obj(&src, &MeshGenConfig::default().with_min_dist(8.0)).unwrap();
    mesh.set_displacements(&|_: &Point2d| Vector2d::new(3.0, -2.0));
    for interp in [Interpolation::Nearest, Interpolation::Linear, Interpolation::Classify] {
        let out = mesh_transform_obj(&src, &mesh, interp).unwrap();
        let Object::Domain2D(d) = out else {
            panic!("expected a domain object");
        };
        let bbox = d.domain.bounding_box().unwrap();
        assert_eq!((bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max), (3, -2, 34, 29));
        assert_eq!(d.grey_at(3 + 16, -2 + 16), Some(GreyValue::UByte(200)));
        assert_eq!(d.grey_at(3 + 2, -2 + 2), Some(GreyValue::UByte(20)));
        assert_eq!(d.values.as_ref().unwrap().background(), GreyValue::UByte(0));
    }
}

#[test]
fn test_gradient_mesh_warp() {
    let src = square_image(48);
    let config = MeshGenConfig::default()
        .with_method(MeshGenMethod::Gradient)
        .with_min_dist(4.0)
        .with_max_dist(12.0);
    let mut mesh = mesh_from_obj(&src, &config).unwrap();
    mesh.set_displacements(&|p: &Point2d| Vector2d::new(0.1 * (p.y - 24.0), 0.0));
    let out = mesh_transform_obj(&src, &mesh, Interpolation::Linear).unwrap();
    let Object::Domain2D(d) = out else {
        panic!("expected a domain object");
    };
    assert!(d.domain.area() > 0);
    assert_eq!(d.values.unwrap().grey_type(), meshwarp_core::GreyType::UByte);
}

#[test]
fn test_collapsed_mesh_is_adapted_before_use() {
    let src = square_image(32);
    let mut mesh = mesh_from_obj(&src, &MeshGenConfig::default().with_min_dist(8.0)).unwrap();
    // Squash one interior node onto its neighbour
    let target = mesh
        .nodes()
        .iter()
        .position(|n| n.position == Point2d::new(16.0, 16.0))
        .unwrap();
    mesh.set_displacement(target, Vector2d::new(7.9, 0.0)).unwrap();
    assert!(mesh_transform_adapt(&mesh, 1.0).unwrap().node_count() < mesh.node_count());
    let out = mesh_transform_obj(&src, &mesh, Interpolation::Nearest).unwrap();
    assert!(matches!(out, Object::Domain2D(_)));
}

#[test]
fn test_affine_product_composes() {
    let mut mesh = single_triangle();
    mesh.set_displacement(1, Vector2d::new(5.0, 0.0)).unwrap();
    let affine = Transform2D::scaling(Vector2d::new(2.0, 2.0));
    mesh_affine_product(&mut mesh, &affine);
    let c = Point2d::new(10.0 / 3.0, 10.0 / 3.0);
    let p = mesh_transform_vertex(&mesh, &c).unwrap();
    assert_relative_eq!(p.x, 2.0 * 1.5 * c.x, epsilon = 1e-9);
    assert_relative_eq!(p.y, 2.0 * c.y, epsilon = 1e-9);
}

#[test]
fn test_mesh_from_control_points() {
    let obj = Object::Domain2D(DomainObject::new(
        IntervalDomain::from_rect(0, 0, 20, 20),
        None,
    ));
    let src = [
        Point2d::new(0.0, 0.0),
        Point2d::new(20.0, 0.0),
        Point2d::new(0.0, 20.0),
        Point2d::new(20.0, 20.0),
    ];
    let dst: Vec<Point2d> = src.iter().map(|p| Point2d::new(p.x + 4.0, p.y - 1.0)).collect();
    let config = MeshGenConfig::default().with_min_dist(5.0);
    let mesh = mesh_transform_from_control_points(&obj, &src, &dst, &config, None).unwrap();
    let p = mesh_transform_vertex(&mesh, &Point2d::new(7.0, 9.0)).unwrap();
    assert_relative_eq!(p.x, 11.0, epsilon = 1e-6);
    assert_relative_eq!(p.y, 8.0, epsilon = 1e-6);

    let wobble = |p: &Point2d| Vector2d::new(0.0, 0.01 * p.x);
    let field: &dyn DisplacementField = &wobble;
    let mesh = mesh_transform_from_control_points(&obj, &src, &dst, &config, Some(field)).unwrap();
    let p = mesh_transform_vertex(&mesh, &Point2d::new(10.0, 10.0)).unwrap();
    assert_relative_eq!(p.x, 14.0, epsilon = 1e-6);
    assert_relative_eq!(p.y, 9.1, epsilon = 1e-6);
}
