use crate::intersect::strip_closure;
use nalgebra::{distance, Point2};

/// Bring a closed polyline to `target` vertices.
///
/// Sparser rings are re-interpolated at equal arc-length spacing along the
/// closed outline; denser rings keep every `n / target`-th vertex, so
/// original vertices survive where possible. Explicitly closed input comes
/// back explicitly closed.
pub fn resample(points: &[Point2<f64>], target: usize) -> Vec<Point2<f64>> {
    let ring = strip_closure(points);
    let closed = ring.len() != points.len();
    let n = ring.len();
    if target < 3 || n < 3 || n == target {
        return points.to_vec();
    }

    let mut out = if n > target {
        (0..target).map(|k| ring[k * n / target]).collect()
    } else {
        interpolate(ring, target)
    };
    if closed {
        if let Some(&first) = out.first() {
            out.push(first);
        }
    }
    out
}

/// Insert evenly spaced points on every edge of a closed ring (closing
/// edge included) so that no gap exceeds `max_spacing`. Original vertices
/// are kept; explicit closure is not added.
pub fn densify(ring: &[Point2<f64>], max_spacing: f64) -> Vec<Point2<f64>> {
    let ring = strip_closure(ring);
    let n = ring.len();
    if n < 2 || max_spacing.is_nan() || max_spacing <= 0.0 {
        return ring.to_vec();
    }
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let pieces = (distance(&a, &b) / max_spacing).ceil().max(1.0) as usize;
        out.extend((0..pieces).map(|k| a + (b - a) * (k as f64 / pieces as f64)));
    }
    out
}

fn interpolate(ring: &[Point2<f64>], target: usize) -> Vec<Point2<f64>> {
    let n = ring.len();
    let mut cumulative = Vec::with_capacity(n + 1);
    cumulative.push(0.0);
    for i in 0..n {
        let last = cumulative[i];
        cumulative.push(last + distance(&ring[i], &ring[(i + 1) % n]));
    }
    let total = cumulative[n];
    if total <= f64::EPSILON {
        return vec![ring[0]; target];
    }

    let mut out = Vec::with_capacity(target);
    let mut seg = 0;
    for k in 0..target {
        let s = total * k as f64 / target as f64;
        while seg + 1 < n && cumulative[seg + 1] <= s {
            seg += 1;
        }
        let len = cumulative[seg + 1] - cumulative[seg];
        let t = if len > 0.0 { (s - cumulative[seg]) / len } else { 0.0 };
        let a = ring[seg];
        let b = ring[(seg + 1) % n];
        out.push(a + (b - a) * t);
    }
    out
}
