use nalgebra::Point2;

#[inline]
pub(crate) fn cross(o: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Graham scan convex hull.
///
/// Pivot is the lowest-y point (leftmost on ties); the rest are sorted by
/// polar angle around it with nearer points first on equal angles, and the
/// stack pops while the turn is not strictly counter-clockwise in a y-up
/// frame. Collinear points are dropped. Fewer than three distinct input
/// points come back deduplicated.
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut pts: Vec<Point2<f64>> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let pivot_idx = pts
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let pivot = pts.swap_remove(pivot_idx);

    pts.sort_by(|a, b| {
        let ta = (a.y - pivot.y).atan2(a.x - pivot.x);
        let tb = (b.y - pivot.y).atan2(b.x - pivot.x);
        ta.total_cmp(&tb).then_with(|| {
            nalgebra::distance_squared(&pivot, a).total_cmp(&nalgebra::distance_squared(&pivot, b))
        })
    });

    let mut hull: Vec<Point2<f64>> = Vec::with_capacity(pts.len() + 1);
    hull.push(pivot);
    for p in pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull
}
