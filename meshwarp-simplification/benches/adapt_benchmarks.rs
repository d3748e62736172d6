//! Benchmarks for area-driven adaptation of displaced block meshes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use meshwarp_build::mesh_from_obj_block;
use meshwarp_core::{DomainObject, IntervalDomain, MeshTransform, Object, Point2d, Vector2d};
use meshwarp_simplification::mesh_transform_adapt;

/// Block mesh over a square with a swirl that squashes the cells near the
/// centre
fn generate_swirled_mesh(size: i32, dist: i32) -> MeshTransform {
    let obj = Object::Domain2D(DomainObject::new(
        IntervalDomain::from_rect(0, 0, size - 1, size - 1),
        None,
    ));
    let mut mesh = mesh_from_obj_block(&obj, dist).unwrap();
    let c = size as f64 / 2.0;
    let r0 = size as f64 / 3.0;
    for (p, d) in mesh.displacements_mut() {
        let v = p - Point2d::new(c, c);
        let r = v.norm();
        let t = (1.0 - r / r0).max(0.0) * 1.2;
        *d = Vector2d::new(
            v.x * t.cos() - v.y * t.sin() - v.x,
            v.x * t.sin() + v.y * t.cos() - v.y,
        );
    }
    mesh
}

fn bench_adapt(c: &mut Criterion) {
    let mut group = c.benchmark_group("adapt");

    for &(size, dist) in &[(64, 4), (128, 4), (256, 8)] {
        let mesh = generate_swirled_mesh(size, dist);
        group.bench_with_input(
            BenchmarkId::new("mesh_transform_adapt", format!("{}e", mesh.element_count())),
            &mesh,
            |b, mesh| {
                b.iter(|| {
                    let result = mesh_transform_adapt(black_box(mesh), 1.0).unwrap();
                    black_box(result);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_adapt);
criterion_main!(benches);
