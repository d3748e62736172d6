//! Object-level mesh transforms

use crate::locate::{mesh_transform_boundlist, mesh_transform_polygon};
use crate::resample::{mesh_transform_values, Interpolation, InverseMaps};
use crate::scan::mesh_scan_convert;
use log::debug;
use meshwarp_build::{domain_from_line_map, mesh_from_obj, MeshGenConfig};
use meshwarp_core::{
    nint, DisplacementField, DomainObject, Error, Interval, IntervalDomain, MeshTransform,
    Object, Point2d, Result, Transform2D,
};
use meshwarp_simplification::mesh_transform_adapt;
use std::collections::BTreeMap;

/// Minimum element area meshes are adapted to before they are applied
pub const TRANSFORM_MIN_AREA: f64 = 1.0;

/// Destination pixels covered by the displaced mesh whose nearest source
/// pixel lies in `src`.
///
/// Built from inverse-mapped pixel membership rather than by filling a
/// transformed boundary.
fn transformed_domain(src: &IntervalDomain, mesh: &MeshTransform) -> Result<IntervalDomain> {
    let intervals = mesh_scan_convert(mesh)?;
    let mut maps = InverseMaps::new(mesh)?;
    let mut lines: BTreeMap<i32, Vec<Interval>> = BTreeMap::new();
    for itv in &intervals {
        let map = maps.get(itv.element)?;
        let mut run: Option<Interval> = None;
        for x in itv.left..=itv.right {
            let p = map.apply(&Point2d::new(x as f64, itv.line as f64));
            if src.contains(nint(p.x), nint(p.y)) {
                run.get_or_insert(Interval::new(x, x)).right = x;
            } else if let Some(r) = run.take() {
                lines.entry(itv.line).or_default().push(r);
            }
        }
        if let Some(r) = run {
            lines.entry(itv.line).or_default().push(r);
        }
    }
    domain_from_line_map(lines)
}

/// Apply a mesh transform to an object.
///
/// The mesh is first copied and adapted so no element is smaller than
/// [`TRANSFORM_MIN_AREA`]; the caller's mesh is never changed. Polygons and
/// boundary lists have their vertices transformed. Domain objects get the
/// covered destination pixels whose source lies in the domain, with values
/// resampled by `interp`; a domain that maps onto no pixels gives an empty
/// object.
pub fn mesh_transform_obj(
    obj: &Object,
    mesh: &MeshTransform,
    interp: Interpolation,
) -> Result<Object> {
    if matches!(obj, Object::Empty) {
        return Ok(Object::Empty);
    }
    let adapted = mesh_transform_adapt(mesh, TRANSFORM_MIN_AREA)?;
    debug!(
        "Transforming {} through {} elements ({} before adaptation)",
        obj.type_name(),
        adapted.element_count(),
        mesh.element_count()
    );
    match obj {
        Object::Empty => Ok(Object::Empty),
        Object::Polygon(poly) => Ok(Object::Polygon(mesh_transform_polygon(&adapted, poly)?)),
        Object::Boundary(bound) => Ok(Object::Boundary(mesh_transform_boundlist(
            &adapted, bound,
        )?)),
        Object::Domain2D(src) => {
            if src.domain.is_empty() {
                return Err(Error::DomainNull);
            }
            let domain = transformed_domain(&src.domain, &adapted)?;
            if domain.is_empty() {
                debug!("Transformed domain is empty");
                return Ok(Object::Empty);
            }
            let values = match src.values {
                Some(_) => Some(mesh_transform_values(&domain, src, &adapted, interp)?),
                None => None,
            };
            Ok(Object::Domain2D(DomainObject::new(domain, values)))
        }
    }
}

/// Fold an affine transform into every node's displacement, so the mesh
/// maps `p` to `affine(mesh(p))`.
pub fn mesh_affine_product(mesh: &mut MeshTransform, affine: &Transform2D) {
    for (position, displacement) in mesh.displacements_mut() {
        let moved = affine.transform_point(&(position + *displacement));
        *displacement = moved - position;
    }
}

/// Build a mesh transform for `obj` from tie points.
///
/// The least-squares affine fit of `src_pts` onto `dst_pts` is folded into
/// the mesh after node displacements are set from `field`, which describes
/// what remains once the affine part is removed.
pub fn mesh_transform_from_control_points(
    obj: &Object,
    src_pts: &[Point2d],
    dst_pts: &[Point2d],
    config: &MeshGenConfig,
    field: Option<&dyn DisplacementField>,
) -> Result<MeshTransform> {
    if src_pts.is_empty() || src_pts.len() != dst_pts.len() {
        return Err(Error::ParamData(format!(
            "Need matching non-empty tie point lists, got {} and {}",
            src_pts.len(),
            dst_pts.len()
        )));
    }
    let mut mesh = mesh_from_obj(obj, config)?;
    let affine = Transform2D::fit_least_squares(src_pts, dst_pts)?;
    if let Some(field) = field {
        mesh.set_displacements(field);
    }
    mesh_affine_product(&mut mesh, &affine);
    debug!(
        "Mesh from {} tie points: {} nodes, {} elements",
        src_pts.len(),
        mesh.node_count(),
        mesh.element_count()
    );
    Ok(mesh)
}
