use nalgebra::Point2;
use outline_core::Contour;

/// Vertices of the fallback polygon.
pub const FALLBACK_VERTICES: usize = 20;
/// Fallback radius as a fraction of the shorter image side.
pub const FALLBACK_RADIUS_FRACTION: f64 = 0.3;

/// Regular polygon returned when no strategy produced an outline.
///
/// Centred on `center` with radius `0.3 · min(width, height)`; the contour
/// is explicitly closed, so it holds `FALLBACK_VERTICES + 1` points.
pub fn fallback_shape(center: Point2<f64>, width: usize, height: usize) -> Contour {
    let radius = FALLBACK_RADIUS_FRACTION * width.min(height) as f64;
    let points = (0..FALLBACK_VERTICES)
        .map(|i| {
            let t = i as f64 * std::f64::consts::TAU / FALLBACK_VERTICES as f64;
            Point2::new(center.x + radius * t.cos(), center.y + radius * t.sin())
        })
        .collect();
    Contour::new(points).closed()
}
