//! Scalar images over interval domains for gradient-driven meshing

use meshwarp_core::{DomainObject, Error, IntervalDomain, Point2i, Result};
use ndarray::Array2;

#[cfg(feature = "parallel")]
use ndarray::Zip;

/// Which side of a threshold to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdSide {
    /// Values at or above the threshold
    High,
    /// Values below the threshold
    Low,
}

/// A double raster over the bounding box of a domain. Element `[[row, col]]`
/// is pixel `(origin.x + col, origin.y + row)`; `mask` marks domain pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarImage {
    pub origin: Point2i,
    pub data: Array2<f64>,
    pub mask: Array2<bool>,
}

impl ScalarImage {
    /// Zero image over the domain
    pub fn from_domain(domain: &IntervalDomain) -> Result<Self> {
        let bbox = domain.bounding_box().ok_or(Error::DomainNull)?;
        let (rows, cols) = (bbox.height(), bbox.width());
        let origin = Point2i::new(bbox.x_min, bbox.y_min);
        let mut mask = Array2::from_elem((rows, cols), false);
        for (y, itv) in domain.intervals() {
            let row = (y - origin.y) as usize;
            for x in itv.left..=itv.right {
                mask[[row, (x - origin.x) as usize]] = true;
            }
        }
        Ok(Self {
            origin,
            data: Array2::zeros((rows, cols)),
            mask,
        })
    }

    /// Grey values of a domain object as doubles. RGBA values are a
    /// `GreyType` error.
    pub fn from_domain_object(obj: &DomainObject) -> Result<Self> {
        let mut img = Self::from_domain(&obj.domain)?;
        let Some(values) = obj.values.as_ref() else {
            return Ok(img);
        };
        for ((row, col), v) in img.data.indexed_iter_mut() {
            let x = img.origin.x + col as i32;
            let y = img.origin.y + row as i32;
            *v = values.get(x, y).as_f64().ok_or_else(|| {
                Error::GreyType("RGBA values have no scalar gradient".to_string())
            })?;
        }
        Ok(img)
    }

    fn value_or(&self, row: isize, col: isize, fallback: f64) -> f64 {
        if row < 0 || col < 0 {
            return fallback;
        }
        let idx = [row as usize, col as usize];
        match self.mask.get(idx) {
            Some(true) => self.data[idx],
            _ => fallback,
        }
    }

    fn laplacian_at(&self, row: usize, col: usize) -> f64 {
        if !self.mask[[row, col]] {
            return 0.0;
        }
        let c = self.data[[row, col]];
        let (r, k) = (row as isize, col as isize);
        let mut sum = 0.0;
        for dr in -1..=1 {
            for dk in -1..=1 {
                if dr != 0 || dk != 0 {
                    sum += self.value_or(r + dr, k + dk, c);
                }
            }
        }
        (sum - 8.0 * c).abs()
    }

    /// Magnitude of the 8-neighbour Laplacian. Neighbours outside the domain
    /// take the centre value.
    pub fn laplacian_magnitude(&self) -> ScalarImage {
        #[cfg(feature = "parallel")]
        let data = Zip::indexed(&self.data).par_map_collect(|(row, col), _| self.laplacian_at(row, col));
        #[cfg(not(feature = "parallel"))]
        let data = Array2::from_shape_fn(self.data.dim(), |(row, col)| self.laplacian_at(row, col));
        ScalarImage {
            origin: self.origin,
            data,
            mask: self.mask.clone(),
        }
    }

    /// Minimum and maximum over the masked pixels
    pub fn range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .zip(self.mask.iter())
            .filter(|(_, m)| **m)
            .fold(None, |acc, (&v, _)| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Sub-sample by taking the minimum over each `step` x `step` cell of the
    /// pixel grid. Output pixel `(i, j)` covers source pixels
    /// `[i * step, (i + 1) * step)` in each axis.
    pub fn sample_min(&self, step: usize) -> ScalarImage {
        let step = step.max(1);
        if step == 1 {
            return self.clone();
        }
        let s = step as i32;
        let (rows, cols) = self.data.dim();
        let c0 = Point2i::new(self.origin.x.div_euclid(s), self.origin.y.div_euclid(s));
        let c1 = Point2i::new(
            (self.origin.x + cols as i32 - 1).div_euclid(s),
            (self.origin.y + rows as i32 - 1).div_euclid(s),
        );
        let dim = ((c1.y - c0.y + 1) as usize, (c1.x - c0.x + 1) as usize);
        let mut data = Array2::from_elem(dim, f64::INFINITY);
        let mut mask = Array2::from_elem(dim, false);
        for ((row, col), &v) in self.data.indexed_iter() {
            if !self.mask[[row, col]] {
                continue;
            }
            let cx = (self.origin.x + col as i32).div_euclid(s) - c0.x;
            let cy = (self.origin.y + row as i32).div_euclid(s) - c0.y;
            let idx = [cy as usize, cx as usize];
            mask[idx] = true;
            data[idx] = data[idx].min(v);
        }
        data.zip_mut_with(&mask, |v, &m| {
            if !m {
                *v = 0.0;
            }
        });
        ScalarImage {
            origin: c0,
            data,
            mask,
        }
    }

    /// Domain of masked pixels on one side of `thr`
    pub fn threshold(&self, thr: f64, side: ThresholdSide) -> IntervalDomain {
        let mut keep = self.mask.clone();
        keep.zip_mut_with(&self.data, |k, &v| {
            *k = *k
                && match side {
                    ThresholdSide::High => v >= thr,
                    ThresholdSide::Low => v < thr,
                };
        });
        IntervalDomain::from_mask(self.origin, &keep)
    }
}
