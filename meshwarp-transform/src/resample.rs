//! Grey value resampling through a mesh transform
//!
//! Destination pixels are visited in raster order. Each one is matched to
//! the scan interval covering it, mapped back into the source by that
//! element's inverse affine map and sampled with the chosen interpolation.

use crate::scan::{mesh_scan_convert, ScanCursor, ScanInterval};
use log::debug;
use meshwarp_core::{
    nint, AffineCoeffs, DomainObject, Error, GreyPixel, GreyRaster, GreyType, GreyValue,
    IntervalDomain, MeshTransform, Point2d, Point2i, Result, ValueTable,
};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How source grey values are sampled at non-integer positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interpolation {
    /// Value of the nearest pixel
    #[default]
    Nearest,
    /// Bilinear blend of the four surrounding pixels
    Linear,
    /// Most heavily weighted value among the four surrounding pixels
    Classify,
}

impl FromStr for Interpolation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Interpolation::Nearest),
            "linear" => Ok(Interpolation::Linear),
            "classify" => Ok(Interpolation::Classify),
            other => Err(Error::InterpolationType(format!(
                "Unknown interpolation '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Interpolation::Nearest => "nearest",
            Interpolation::Linear => "linear",
            Interpolation::Classify => "classify",
        };
        f.write_str(name)
    }
}

/// Bilinear weights of the four neighbours `(0,0), (1,0), (0,1), (1,1)`
#[inline]
fn bilinear_weights(p: f64, q: f64) -> [f64; 4] {
    [(1.0 - p) * (1.0 - q), p * (1.0 - q), (1.0 - p) * q, p * q]
}

/// Value of the class with the greatest summed bilinear weight among the
/// four neighbour values `g`. Classes are formed in neighbour order and the
/// first class seen wins a tie.
pub fn classify_value(g: [f64; 4], p: f64, q: f64) -> f64 {
    let w = bilinear_weights(p, q);
    let mut classes: Vec<(f64, f64)> = Vec::with_capacity(4);
    for (value, weight) in g.into_iter().zip(w) {
        match classes.iter_mut().find(|(v, _)| *v == value) {
            Some((_, total)) => *total += weight,
            None => classes.push((value, weight)),
        }
    }
    let mut best = 0;
    let mut best_weight = 0.0;
    for (i, &(_, total)) in classes.iter().enumerate() {
        if total > best_weight {
            best_weight = total;
            best = i;
        }
    }
    classes[best].0
}

/// Bilinear blend of the four neighbour values `g`
pub fn linear_value(g: [f64; 4], p: f64, q: f64) -> f64 {
    g.into_iter()
        .zip(bilinear_weights(p, q))
        .map(|(v, w)| v * w)
        .sum()
}

/// Per-element inverse maps, displaced to source, solved on first use
pub(crate) struct InverseMaps<'a> {
    mesh: &'a MeshTransform,
    maps: Vec<Option<AffineCoeffs>>,
}

impl<'a> InverseMaps<'a> {
    pub(crate) fn new(mesh: &'a MeshTransform) -> Result<Self> {
        let mut maps = Vec::new();
        maps.try_reserve_exact(mesh.elements().len())?;
        maps.resize(mesh.elements().len(), None);
        Ok(Self { mesh, maps })
    }

    pub(crate) fn get(&mut self, elem: usize) -> Result<AffineCoeffs> {
        if let Some(map) = self.maps[elem] {
            return Ok(map);
        }
        let src = self.mesh.source_triangle(elem);
        let dst = self.mesh.displaced_triangle(elem);
        let map = AffineCoeffs::try_solve(&dst, &src).ok_or_else(|| {
            Error::DomainData(format!("Displaced element {} is degenerate", elem))
        })?;
        self.maps[elem] = Some(map);
        Ok(map)
    }
}

/// Scan cursor plus inverse maps for raster-order lookups
struct InverseMapper<'a> {
    cursor: ScanCursor<'a>,
    maps: InverseMaps<'a>,
}

impl<'a> InverseMapper<'a> {
    fn new(mesh: &'a MeshTransform, intervals: &'a [ScanInterval]) -> Result<Self> {
        Ok(Self {
            cursor: ScanCursor::new(intervals),
            maps: InverseMaps::new(mesh)?,
        })
    }

    /// Source position of destination pixel `(x, y)`, `None` when no scan
    /// interval covers it
    fn map(&mut self, x: i32, y: i32) -> Result<Option<Point2d>> {
        let Some(itv) = self.cursor.seek(x, y) else {
            return Ok(None);
        };
        let map = self.maps.get(itv.element)?;
        Ok(Some(map.apply(&Point2d::new(x as f64, y as f64))))
    }
}

fn sample(src: &DomainObject, interp: Interpolation, pos: &Point2d) -> Result<f64> {
    let grey = |x: i32, y: i32| -> Result<f64> {
        src.grey_at(x, y)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| Error::GreyType("Values are not scalar".to_string()))
    };
    match interp {
        Interpolation::Nearest => grey(nint(pos.x), nint(pos.y)),
        Interpolation::Linear | Interpolation::Classify => {
            let (fx, fy) = (pos.x.floor(), pos.y.floor());
            let (x0, y0) = (fx as i32, fy as i32);
            let g = [
                grey(x0, y0)?,
                grey(x0 + 1, y0)?,
                grey(x0, y0 + 1)?,
                grey(x0 + 1, y0 + 1)?,
            ];
            let (p, q) = (pos.x - fx, pos.y - fy);
            Ok(match interp {
                Interpolation::Linear => linear_value(g, p, q),
                _ => classify_value(g, p, q),
            })
        }
    }
}

fn typed_raster<T: GreyPixel>(values: &Array2<f64>) -> Array2<T> {
    values.mapv(T::from_interpolated)
}

/// Resample the values of `src` over `dst_domain` through the displaced
/// mesh. The result has the source grey type and background; pixels of the
/// destination bounding box outside `dst_domain` hold the background.
///
/// A destination pixel no element covers is a `DomainData` error, RGBA
/// values a `GreyType` error.
pub fn mesh_transform_values(
    dst_domain: &IntervalDomain,
    src: &DomainObject,
    mesh: &MeshTransform,
    interp: Interpolation,
) -> Result<ValueTable> {
    let values = src
        .values
        .as_ref()
        .ok_or_else(|| Error::GreyType("Source object has no values".to_string()))?;
    let grey_type = values.grey_type();
    if grey_type == GreyType::Rgba {
        return Err(Error::GreyType("RGBA values cannot be resampled".to_string()));
    }
    let background = values.background();
    let bbox = dst_domain.bounding_box().ok_or(Error::DomainNull)?;
    let origin = Point2i::new(bbox.x_min, bbox.y_min);

    let bkg = background.as_f64().unwrap_or(0.0);
    let mut out = Array2::from_elem((bbox.height(), bbox.width()), bkg);

    let intervals = mesh_scan_convert(mesh)?;
    let mut mapper = InverseMapper::new(mesh, &intervals)?;
    for (y, itv) in dst_domain.intervals() {
        let row = (y - origin.y) as usize;
        for x in itv.left..=itv.right {
            let pos = mapper.map(x, y)?.ok_or_else(|| {
                Error::DomainData(format!("Pixel ({}, {}) is not covered by the mesh", x, y))
            })?;
            out[[row, (x - origin.x) as usize]] = sample(src, interp, &pos)?;
        }
    }

    let raster = match background {
        GreyValue::Int(_) => GreyRaster::Int(typed_raster(&out)),
        GreyValue::Short(_) => GreyRaster::Short(typed_raster(&out)),
        GreyValue::UByte(_) => GreyRaster::UByte(typed_raster(&out)),
        GreyValue::Float(_) => GreyRaster::Float(typed_raster(&out)),
        GreyValue::Double(_) => GreyRaster::Double(out),
        GreyValue::Rgba(_) => {
            return Err(Error::GreyType("RGBA values cannot be resampled".to_string()))
        }
    };
    debug!(
        "Resampled {} pixels ({:?}, {})",
        dst_domain.area(),
        grey_type,
        interp
    );
    ValueTable::new(origin, raster, background)
}
