//! Boundary polygon spacing fix-up
//!
//! A modified Jarvis march round a convex polygon. Each step picks the next
//! hull vertex from the current one and, when it is closer than the minimum
//! distance, slides it away along their common line until the gap is exactly
//! the minimum distance. Vertices that fall inside the ring are dropped.

use meshwarp_core::{signed_area2, Error, Point2d, Result, MESH_TOLERANCE};

/// Return the polygon with every side at least `min_dist` long.
///
/// Input vertices are counter-clockwise; a repeated closing vertex is
/// ignored. Fewer than three distinct vertices is an error.
pub fn fix_boundary_polygon(vertices: &[Point2d], min_dist: f64) -> Result<Vec<Point2d>> {
    let mut n = vertices.len();
    while n > 1 && vertices[n - 1] == vertices[0] {
        n -= 1;
    }
    if n < 3 {
        return Err(Error::DomainData(format!(
            "Boundary polygon has {} distinct vertices",
            n
        )));
    }
    let mut vx: Vec<Point2d> = vertices[..n].to_vec();
    let mut next: Vec<usize> = (0..n).map(|i| (i + 1) % n).collect();
    let slide_below_sq = (min_dist - MESH_TOLERANCE).max(0.0).powi(2);

    let mut ring_len = n;
    let mut clean_steps = 0;
    let mut cur = 0;
    let max_steps = 8 * n + 16;
    for _ in 0..max_steps {
        if ring_len < 3 {
            return Err(Error::DomainData(
                "Boundary polygon collapsed during fix-up".to_string(),
            ));
        }
        let old_next = next[cur];
        let mut cvx = old_next;
        let mut tst = next[cvx];
        while tst != cur {
            if signed_area2(&vx[cur], &vx[cvx], &vx[tst]) < 0.0
                || vx[cvx] == vx[cur]
            {
                cvx = tst;
            }
            tst = next[tst];
        }

        let mut dropped = 0;
        let mut v = old_next;
        while v != cvx {
            dropped += 1;
            v = next[v];
        }
        next[cur] = cvx;
        ring_len -= dropped;

        let seg = vx[cvx] - vx[cur];
        let len_sq = seg.norm_squared();
        let slid = len_sq < slide_below_sq && len_sq > 0.0;
        if slid {
            vx[cvx] = vx[cur] + seg * (min_dist / len_sq.sqrt());
        }

        if slid || dropped > 0 {
            clean_steps = 0;
        } else {
            clean_steps += 1;
        }
        cur = cvx;
        if clean_steps >= ring_len {
            let mut out = Vec::with_capacity(ring_len);
            let first = cur;
            out.push(vx[first]);
            let mut v = next[first];
            while v != first {
                out.push(vx[v]);
                v = next[v];
            }
            return Ok(out);
        }
    }
    Err(Error::DomainData(
        "Boundary polygon fix-up did not converge".to_string(),
    ))
}
