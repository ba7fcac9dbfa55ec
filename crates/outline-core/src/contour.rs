use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// A point in real-world units (e.g. millimetres).
///
/// Kept distinct from pixel-space `Point2<f64>` so the two spaces can only be
/// mixed through an explicit calibration transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RealPoint {
    pub x: f64,
    pub y: f64,
}

impl RealPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Ordered pixel-space polygon.
///
/// The polygon is "closed" when the last point repeats the first one. Most
/// geometry helpers take the ring without the repeated point; see
/// [`Contour::ring`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<Point2<f64>>,
}

impl Contour {
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.points.len() >= 2 && self.points.first() == self.points.last()
    }

    /// Points without the closing duplicate.
    pub fn ring(&self) -> &[Point2<f64>] {
        if self.is_closed() {
            &self.points[..self.points.len() - 1]
        } else {
            &self.points
        }
    }

    /// Number of distinct polygon vertices.
    pub fn vertex_count(&self) -> usize {
        self.ring().len()
    }

    pub fn is_valid(&self) -> bool {
        self.vertex_count() >= 3
    }

    /// Copy with the first point repeated at the end.
    pub fn closed(&self) -> Contour {
        let mut points = self.ring().to_vec();
        if let Some(&first) = points.first() {
            points.push(first);
        }
        Contour { points }
    }

    pub fn area(&self) -> f64 {
        polygon_area(self.ring())
    }

    pub fn perimeter(&self) -> f64 {
        perimeter(self.ring())
    }

    /// Mean of the ring vertices.
    pub fn centroid(&self) -> Option<Point2<f64>> {
        let ring = self.ring();
        if ring.is_empty() {
            return None;
        }
        let n = ring.len() as f64;
        let (sx, sy) = ring.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point2::new(sx / n, sy / n))
    }

    /// Uniformly scale all coordinates (used to map between processing and
    /// original resolution).
    pub fn scaled(&self, factor: f64) -> Contour {
        Contour {
            points: self
                .points
                .iter()
                .map(|p| Point2::new(p.x * factor, p.y * factor))
                .collect(),
        }
    }
}

/// Shoelace area; positive for counter-clockwise rings in a y-up frame.
pub fn signed_area(ring: &[Point2<f64>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for (i, p) in ring.iter().enumerate() {
        let q = ring[(i + 1) % ring.len()];
        acc += p.x * q.y - q.x * p.y;
    }
    0.5 * acc
}

pub fn polygon_area(ring: &[Point2<f64>]) -> f64 {
    signed_area(ring).abs()
}

/// Length of the closed polyline through `ring`.
pub fn perimeter(ring: &[Point2<f64>]) -> f64 {
    if ring.len() < 2 {
        return 0.0;
    }
    (0..ring.len())
        .map(|i| nalgebra::distance(&ring[i], &ring[(i + 1) % ring.len()]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(side: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ]
    }

    #[test]
    fn closing_is_idempotent() {
        let c = Contour::new(square(2.0));
        assert!(!c.is_closed());
        let closed = c.closed();
        assert!(closed.is_closed());
        assert_eq!(closed.len(), 5);
        assert_eq!(closed.closed(), closed);
        assert_eq!(closed.vertex_count(), 4);
    }

    #[test]
    fn area_and_perimeter_of_square() {
        let c = Contour::new(square(10.0)).closed();
        assert_relative_eq!(c.area(), 100.0);
        assert_relative_eq!(c.perimeter(), 40.0);
        let centroid = c.centroid().unwrap();
        assert_relative_eq!(centroid.x, 5.0);
        assert_relative_eq!(centroid.y, 5.0);
    }

    #[test]
    fn degenerate_rings_have_zero_area() {
        assert_eq!(signed_area(&square(1.0)[..2]), 0.0);
        assert!(!Contour::new(square(1.0)[..2].to_vec()).is_valid());
    }
}
