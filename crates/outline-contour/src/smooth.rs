use nalgebra::Point2;

/// Circular Gaussian moving average over a closed ring.
///
/// `window` is the number of taps (bumped to odd); weights are
/// `exp(-d²/2σ²)` normalised to sum to one, applied to x and y
/// independently. Windows below 3, a non-positive sigma or rings shorter
/// than 3 points return the input unchanged.
pub fn smooth(ring: &[Point2<f64>], window: usize, sigma: f64) -> Vec<Point2<f64>> {
    let n = ring.len();
    if window < 3 || n < 3 || sigma <= 0.0 {
        return ring.to_vec();
    }
    let half = ((window | 1) / 2).min((n - 1) / 2) as i64;
    let weights: Vec<f64> = (-half..=half)
        .map(|d| (-(d * d) as f64 / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f64 = weights.iter().sum();

    (0..n as i64)
        .map(|i| {
            let (mut x, mut y) = (0.0, 0.0);
            for (k, w) in weights.iter().enumerate() {
                let j = (i + k as i64 - half).rem_euclid(n as i64) as usize;
                x += w * ring[j].x;
                y += w * ring[j].y;
            }
            Point2::new(x / total, y / total)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn spike_is_pulled_toward_neighbours() {
        let mut ring: Vec<Point2<f64>> = (0..20)
            .map(|i| {
                let t = i as f64 * std::f64::consts::TAU / 20.0;
                Point2::new(50.0 * t.cos(), 50.0 * t.sin())
            })
            .collect();
        ring[5] = Point2::new(0.0, 80.0);
        let out = smooth(&ring, 5, 1.0);
        assert_eq!(out.len(), ring.len());
        assert!(out[5].y < 70.0);
    }

    #[test]
    fn centroid_is_preserved() {
        let ring: Vec<Point2<f64>> = (0..16)
            .map(|i| Point2::new((i % 4) as f64 * 3.0 + 1.0, (i / 4) as f64 * 2.0))
            .collect();
        let out = smooth(&ring, 7, 2.0);
        let c = |r: &[Point2<f64>]| r.iter().fold(0.0, |a, p| a + p.x) / r.len() as f64;
        assert_relative_eq!(c(&ring), c(&out), epsilon = 1e-9);
    }

    #[test]
    fn tiny_window_is_identity() {
        let ring = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
        assert_eq!(smooth(&ring, 1, 1.0), ring);
    }
}
