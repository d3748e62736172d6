//! Morphology on interval domains: disc dilation, convex hulls and
//! convex polygon fill

use itertools::Itertools;
use meshwarp_core::{signed_area2, Interval, IntervalDomain, Point2d, Result};
use std::collections::BTreeMap;

/// Merge sorted-by-left intervals that overlap or touch
fn merge_intervals(mut itvs: Vec<Interval>) -> Vec<Interval> {
    itvs.sort_unstable_by_key(|i| i.left);
    let mut merged: Vec<Interval> = Vec::with_capacity(itvs.len());
    for itv in itvs {
        match merged.last_mut() {
            Some(last) if itv.left <= last.right + 1 => last.right = last.right.max(itv.right),
            _ => merged.push(itv),
        }
    }
    merged
}

/// Domain from unsorted, possibly overlapping intervals keyed by line
pub fn domain_from_line_map(lines: BTreeMap<i32, Vec<Interval>>) -> Result<IntervalDomain> {
    let (Some(&first), Some(&last)) = (lines.keys().next(), lines.keys().next_back()) else {
        return Ok(IntervalDomain::empty());
    };
    let mut rows = vec![Vec::new(); (last - first + 1) as usize];
    for (y, itvs) in lines {
        rows[(y - first) as usize] = merge_intervals(itvs);
    }
    IntervalDomain::from_lines(first, rows)
}

/// Structural dilation by a disc of the given radius
pub fn disc_dilation(domain: &IntervalDomain, radius: i32) -> Result<IntervalDomain> {
    let radius = radius.max(0);
    let half_widths: Vec<(i32, i32)> = (-radius..=radius)
        .map(|dy| {
            let w = (((radius * radius - dy * dy) as f64).sqrt()).floor() as i32;
            (dy, w)
        })
        .collect();
    let mut lines: BTreeMap<i32, Vec<Interval>> = BTreeMap::new();
    for (y, itv) in domain.intervals() {
        for &(dy, w) in &half_widths {
            lines
                .entry(y + dy)
                .or_default()
                .push(Interval::new(itv.left - w, itv.right + w));
        }
    }
    domain_from_line_map(lines)
}

/// Convex hull of the domain's pixel centres, counter-clockwise without
/// repeated or collinear vertices.
pub fn convex_hull(domain: &IntervalDomain) -> Vec<Point2d> {
    let points: Vec<Point2d> = domain
        .intervals()
        .flat_map(|(y, itv)| {
            [
                Point2d::new(itv.left as f64, y as f64),
                Point2d::new(itv.right as f64, y as f64),
            ]
        })
        .sorted_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)))
        .dedup()
        .collect();
    if points.len() < 3 {
        return points;
    }
    let mut hull: Vec<Point2d> = Vec::with_capacity(2 * points.len());
    for pass in [points.iter().collect::<Vec<_>>(), points.iter().rev().collect()] {
        let base = hull.len();
        for p in pass {
            while hull.len() >= base + 2
                && signed_area2(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
            {
                hull.pop();
            }
            hull.push(*p);
        }
        hull.pop();
    }
    hull
}

/// Pixels inside a convex polygon, boundary included
pub fn fill_convex_polygon(vertices: &[Point2d]) -> Result<IntervalDomain> {
    if vertices.len() < 3 {
        return Ok(IntervalDomain::empty());
    }
    let eps = 1.0e-9;
    let y_min = vertices.iter().map(|v| v.y).fold(f64::INFINITY, f64::min);
    let y_max = vertices.iter().map(|v| v.y).fold(f64::NEG_INFINITY, f64::max);
    let mut lines: BTreeMap<i32, Vec<Interval>> = BTreeMap::new();
    for y in (y_min - eps).ceil() as i32..=(y_max + eps).floor() as i32 {
        let yf = y as f64;
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for (a, b) in vertices.iter().circular_tuple_windows() {
            if (a.y - yf) * (b.y - yf) > 0.0 {
                continue;
            }
            if (b.y - a.y).abs() < eps {
                lo = lo.min(a.x.min(b.x));
                hi = hi.max(a.x.max(b.x));
            } else {
                let x = a.x + (yf - a.y) * (b.x - a.x) / (b.y - a.y);
                lo = lo.min(x);
                hi = hi.max(x);
            }
        }
        let left = (lo - eps).ceil() as i32;
        let right = (hi + eps).floor() as i32;
        if lo <= hi && left <= right {
            lines.insert(y, vec![Interval::new(left, right)]);
        }
    }
    domain_from_line_map(lines)
}
