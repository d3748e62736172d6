//! Scan conversion of displaced meshes
//!
//! Each live element is rasterized with its displaced vertices rounded to
//! pixel positions, giving one interval per raster line it covers. All
//! intervals are sorted by line and then left column so a resampler can
//! sweep the destination raster with a cursor that only moves forward.

use meshwarp_core::{nint, Error, MeshTransform, Point2i, Result};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Largest rounded coordinate magnitude whose spans still fit an `i32`
const MAX_RASTER_COORD: i32 = i32::MAX / 4;

/// One element's footprint on one raster line, columns inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanInterval {
    pub element: usize,
    pub line: i32,
    pub left: i32,
    pub right: i32,
}

impl ScanInterval {
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.line == y && x >= self.left && x <= self.right
    }
}

/// Append the intervals of one element. Returns the number appended, zero
/// for elements that round to a horizontal line or a single column.
pub fn scan_element(mesh: &MeshTransform, elem: usize, out: &mut Vec<ScanInterval>) -> Result<usize> {
    let d = mesh
        .displaced_triangle(elem)
        .map(|p| Point2i::new(nint(p.x), nint(p.y)));
    let range = -MAX_RASTER_COORD..=MAX_RASTER_COORD;
    if d.iter().any(|p| !range.contains(&p.x) || !range.contains(&p.y)) {
        return Err(Error::DomainData(format!(
            "Element {} is displaced beyond the raster range",
            elem
        )));
    }

    // Order the vertices by line: min, mid, max
    let i0 = if d[0].y < d[1].y {
        if d[0].y < d[2].y {
            0
        } else {
            2
        }
    } else if d[1].y < d[2].y {
        1
    } else {
        2
    };
    let mut i1 = (i0 + 1) % 3;
    let mut i2 = (i0 + 2) % 3;
    if d[i2].y < d[i1].y {
        std::mem::swap(&mut i1, &mut i2);
    }
    let s = [d[i0], d[i1], d[i2]];

    let d0 = s[0] - s[1];
    let d1 = s[1] - s[2];
    let d2 = s[2] - s[0];
    if d2.y == 0 || (d0.x == 0 && d1.x == 0) {
        return Ok(0);
    }

    let count = (s[2].y - s[0].y + 1) as usize;
    out.try_reserve(count)?;
    let base = out.len();

    // Long edge, min to max
    let inc = d2.x as f64 / d2.y as f64;
    let mut kol = s[0].x as f64;
    for k in 0..count {
        let col = nint(kol);
        out.push(ScanInterval {
            element: elem,
            line: s[0].y + k as i32,
            left: col,
            right: col,
        });
        kol += inc;
    }

    let widen = |itv: &mut ScanInterval, col: i32| {
        if col > itv.left {
            itv.right = col;
        } else {
            itv.left = col;
        }
    };

    // Upper edge, min to mid
    if d0.y != 0 {
        let inc = d0.x as f64 / d0.y as f64;
        let mut kol = s[0].x as f64;
        let n = (s[1].y - s[0].y + 1) as usize;
        for itv in out[base..base + n].iter_mut() {
            widen(itv, nint(kol));
            kol += inc;
        }
    }

    // Lower edge, max back to mid
    if d1.y != 0 {
        let inc = d1.x as f64 / d1.y as f64;
        let mut kol = s[2].x as f64;
        let n = (s[2].y - s[1].y + 1) as usize;
        for itv in out[base + count - n..base + count].iter_mut().rev() {
            widen(itv, nint(kol));
            kol -= inc;
        }
    }
    Ok(count)
}

/// Scan intervals of every live element, sorted by line then left column
pub fn mesh_scan_convert(mesh: &MeshTransform) -> Result<Vec<ScanInterval>> {
    let mut intervals = Vec::new();
    for elem in mesh.live_elements() {
        scan_element(mesh, elem, &mut intervals)?;
    }
    #[cfg(feature = "parallel")]
    intervals.par_sort_by_key(|itv| (itv.line, itv.left));
    #[cfg(not(feature = "parallel"))]
    intervals.sort_by_key(|itv| (itv.line, itv.left));
    Ok(intervals)
}

/// Forward-only cursor over sorted scan intervals for raster-order queries
#[derive(Debug, Clone)]
pub struct ScanCursor<'a> {
    intervals: &'a [ScanInterval],
    idx: usize,
}

impl<'a> ScanCursor<'a> {
    pub fn new(intervals: &'a [ScanInterval]) -> Self {
        Self { intervals, idx: 0 }
    }

    /// Interval covering `(x, y)`. Queries must come in raster order.
    pub fn seek(&mut self, x: i32, y: i32) -> Option<&'a ScanInterval> {
        let itvs = self.intervals;
        while self.idx < itvs.len() && itvs[self.idx].line < y {
            self.idx += 1;
        }
        while self.idx < itvs.len() && itvs[self.idx].line <= y && itvs[self.idx].right < x {
            self.idx += 1;
        }
        itvs.get(self.idx).filter(|itv| itv.contains(x, y))
    }
}
