use crate::hull::cross;
use nalgebra::{distance, Point2};
use outline_core::{perimeter, signed_area};

/// Remove narrow inward notches.
///
/// A reflex vertex is dropped when the detour through it exceeds the direct
/// chord between its neighbours by more than `threshold_ratio` times the
/// ring perimeter (measured once, before pruning). Passes repeat until
/// nothing changes; at least three vertices always remain.
pub fn prune_deep_concavities(ring: &[Point2<f64>], threshold_ratio: f64) -> Vec<Point2<f64>> {
    let mut out = ring.to_vec();
    if out.len() < 4 || threshold_ratio <= 0.0 {
        return out;
    }
    let limit = threshold_ratio * perimeter(&out);
    let orientation = signed_area(&out).signum();

    loop {
        let n = out.len();
        if n <= 3 {
            break;
        }
        let victim = (0..n).find(|&i| {
            let prev = out[(i + n - 1) % n];
            let cur = out[i];
            let next = out[(i + 1) % n];
            let reflex = cross(prev, cur, next) * orientation < 0.0;
            let detour = distance(&prev, &cur) + distance(&cur, &next);
            reflex && detour - distance(&prev, &next) > limit
        });
        match victim {
            Some(i) => {
                out.remove(i);
            }
            None => break,
        }
    }
    if out.len() != ring.len() {
        log::debug!("pruned {} concave vertices", ring.len() - out.len());
    }
    out
}
