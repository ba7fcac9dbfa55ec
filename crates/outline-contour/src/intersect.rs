use crate::hull::{convex_hull, cross};
use nalgebra::Point2;

const EPS: f64 = 1e-12;

fn on_segment(p: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> bool {
    p.x >= a.x.min(b.x) - EPS
        && p.x <= a.x.max(b.x) + EPS
        && p.y >= a.y.min(b.y) - EPS
        && p.y <= a.y.max(b.y) + EPS
}

/// Closed-segment intersection test, touching and collinear overlap included.
pub fn segments_intersect(
    p1: Point2<f64>,
    p2: Point2<f64>,
    q1: Point2<f64>,
    q2: Point2<f64>,
) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);

    if ((d1 > EPS && d2 < -EPS) || (d1 < -EPS && d2 > EPS))
        && ((d3 > EPS && d4 < -EPS) || (d3 < -EPS && d4 > EPS))
    {
        return true;
    }
    (d1.abs() <= EPS && on_segment(p1, q1, q2))
        || (d2.abs() <= EPS && on_segment(p2, q1, q2))
        || (d3.abs() <= EPS && on_segment(q1, p1, p2))
        || (d4.abs() <= EPS && on_segment(q2, p1, p2))
}

/// Whether any two non-adjacent edges of the closed ring intersect.
///
/// Rings may be passed with or without the closing duplicate.
pub fn is_self_intersecting(ring: &[Point2<f64>]) -> bool {
    let ring = strip_closure(ring);
    let n = ring.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let (a1, a2) = (ring[i], ring[(i + 1) % n]);
        for j in i + 2..n {
            // first and last edge share vertex 0
            if i == 0 && j == n - 1 {
                continue;
            }
            if segments_intersect(a1, a2, ring[j], ring[(j + 1) % n]) {
                return true;
            }
        }
    }
    false
}

/// Return the ring unchanged when simple, its convex hull otherwise. The
/// flag reports whether the hull was substituted.
pub fn ensure_simple(ring: &[Point2<f64>]) -> (Vec<Point2<f64>>, bool) {
    let open = strip_closure(ring);
    if is_self_intersecting(open) {
        log::warn!(
            "contour with {} vertices self-intersects, substituting convex hull",
            open.len()
        );
        (convex_hull(open), true)
    } else {
        (open.to_vec(), false)
    }
}

pub(crate) fn strip_closure(ring: &[Point2<f64>]) -> &[Point2<f64>] {
    match ring {
        [first, .., last] if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point2<f64>> {
        raw.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    #[test]
    fn crossing_and_touching_segments() {
        let p = |x, y| Point2::new(x, y);
        assert!(segments_intersect(p(0.0, 0.0), p(2.0, 2.0), p(0.0, 2.0), p(2.0, 0.0)));
        assert!(segments_intersect(p(0.0, 0.0), p(2.0, 0.0), p(2.0, 0.0), p(3.0, 1.0)));
        assert!(segments_intersect(p(0.0, 0.0), p(3.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)));
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(3.0, 0.0)));
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 1.0), p(0.0, 1.0), p(0.4, 0.6)));
    }

    #[test]
    fn bowtie_is_detected_and_replaced() {
        let bowtie = pts(&[(0.0, 0.0), (4.0, 4.0), (4.0, 0.0), (0.0, 4.0)]);
        assert!(is_self_intersecting(&bowtie));
        let (fixed, substituted) = ensure_simple(&bowtie);
        assert!(substituted);
        assert_eq!(fixed.len(), 4);
        assert!(!is_self_intersecting(&fixed));
    }

    #[test]
    fn simple_polygons_pass_through() {
        let closed = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (2.0, 1.0), (0.0, 4.0), (0.0, 0.0)]);
        assert!(!is_self_intersecting(&closed));
        let (out, substituted) = ensure_simple(&closed);
        assert!(!substituted);
        assert_eq!(out.len(), 5);
    }
}
