use nalgebra::Point2;

/// Recursion depth past which a range is kept unsplit.
pub const MAX_SIMPLIFY_DEPTH: usize = 100;

/// Distance from `p` to the infinite line through `a` and `b`; falls back to
/// the distance to `a` when the segment is degenerate.
pub fn perpendicular_distance(p: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mag = (dx * dx + dy * dy).sqrt();
    if mag < 1e-9 {
        return nalgebra::distance(&p, &a);
    }
    (dy * p.x - dx * p.y + b.x * a.y - b.y * a.x).abs() / mag
}

/// Douglas-Peucker simplification of an open polyline.
///
/// The output is a subsequence of `points` that keeps both endpoints.
pub fn simplify(points: &[Point2<f64>], epsilon: f64) -> Vec<Point2<f64>> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    let mut deepest = 0;
    mark(points, 0, points.len() - 1, epsilon, 0, &mut keep, &mut deepest);
    if deepest >= MAX_SIMPLIFY_DEPTH {
        log::warn!("simplification hit the depth bound of {MAX_SIMPLIFY_DEPTH}");
    }
    points
        .iter()
        .zip(&keep)
        .filter_map(|(p, &k)| k.then_some(*p))
        .collect()
}

fn mark(
    points: &[Point2<f64>],
    first: usize,
    last: usize,
    epsilon: f64,
    depth: usize,
    keep: &mut [bool],
    deepest: &mut usize,
) {
    *deepest = (*deepest).max(depth);
    if last <= first + 1 || depth >= MAX_SIMPLIFY_DEPTH {
        return;
    }
    let (a, b) = (points[first], points[last]);
    let (index, dmax) = (first + 1..last)
        .map(|i| (i, perpendicular_distance(points[i], a, b)))
        .fold((first, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

    if dmax > epsilon {
        keep[index] = true;
        mark(points, first, index, epsilon, depth + 1, keep, deepest);
        mark(points, index, last, epsilon, depth + 1, keep, deepest);
    }
}

/// Douglas-Peucker on a closed ring (no repeated closing point).
///
/// The ring is split at the vertex farthest from vertex 0 so that neither
/// half degenerates into a zero-length chord.
pub fn simplify_closed(ring: &[Point2<f64>], epsilon: f64) -> Vec<Point2<f64>> {
    if ring.len() < 4 {
        return ring.to_vec();
    }
    let far = (1..ring.len())
        .max_by(|&i, &j| {
            nalgebra::distance(&ring[0], &ring[i]).total_cmp(&nalgebra::distance(&ring[0], &ring[j]))
        })
        .unwrap_or(ring.len() / 2);

    let first_half = simplify(&ring[..=far], epsilon);
    let mut second: Vec<Point2<f64>> = ring[far..].to_vec();
    second.push(ring[0]);
    let second_half = simplify(&second, epsilon);

    let mut out = first_half;
    // Drop the split vertex duplicate and the closing point.
    out.extend_from_slice(&second_half[1..second_half.len() - 1]);
    out
}
