//! Boundary refinement and acceptance checks shared by every strategy.

use nalgebra::Point2;
use outline_contour::{
    densify, ensure_simple, is_self_intersecting, polygon_area, prune_deep_concavities,
    resample, simplify_closed, smooth,
};

use crate::config::DetectorConfig;

/// Largest gap between ring points handed to the smoother, pixels.
///
/// Traced boundaries already step by at most √2; hulls and ray-cast rings
/// are filled in so the smoothing window spans pixels, not whole edges.
pub const REFINE_SPACING: f64 = 1.5;

/// Fewest distinct vertices an accepted outline may have.
pub const MIN_OUTLINE_VERTICES: usize = 10;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{count} vertices, need at least {min}")]
    TooFewVertices { count: usize, min: usize },
    #[error("area {area:.1} px² below minimum {min:.1}")]
    AreaTooSmall { area: f64, min: f64 },
    #[error("contour still self-intersects")]
    SelfIntersecting,
}

/// Output of [`refine_boundary`]: an open ring plus what happened to it.
#[derive(Clone, Debug)]
pub struct RefinedBoundary {
    pub ring: Vec<Point2<f64>>,
    /// `ensure_simple` replaced a self-intersecting ring by its hull.
    pub hull_substituted: bool,
}

/// `densify → smooth → simplify_closed → prune_deep_concavities → resample
/// → ensure_simple` over a raw boundary ring.
pub fn refine_boundary(boundary: &[Point2<f64>], config: &DetectorConfig) -> RefinedBoundary {
    let dense = densify(boundary, REFINE_SPACING);
    let smoothed = smooth(&dense, config.smoothing_window, config.smoothing_sigma);
    let simplified = simplify_closed(&smoothed, config.simplify_epsilon);
    let pruned = prune_deep_concavities(&simplified, config.concavity_threshold);
    let resampled = resample(&pruned, config.target_vertex_count);
    let (ring, hull_substituted) = ensure_simple(&resampled);
    log::debug!(
        "refined boundary: {} -> {} -> {} -> {} vertices{}",
        boundary.len(),
        simplified.len(),
        pruned.len(),
        ring.len(),
        if hull_substituted { " (hull)" } else { "" }
    );
    RefinedBoundary {
        ring,
        hull_substituted,
    }
}

/// Accept a refined ring: enough vertices, enough area, simple.
pub fn validate(ring: &[Point2<f64>], min_area: f64) -> Result<(), ValidationError> {
    if ring.len() < MIN_OUTLINE_VERTICES {
        return Err(ValidationError::TooFewVertices {
            count: ring.len(),
            min: MIN_OUTLINE_VERTICES,
        });
    }
    let area = polygon_area(ring);
    if area < min_area {
        return Err(ValidationError::AreaTooSmall {
            area,
            min: min_area,
        });
    }
    if is_self_intersecting(ring) {
        return Err(ValidationError::SelfIntersecting);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(n: usize, r: f64) -> Vec<Point2<f64>> {
        (0..n)
            .map(|i| {
                let t = i as f64 * std::f64::consts::TAU / n as f64;
                Point2::new(100.0 + r * t.cos(), 100.0 + r * t.sin())
            })
            .collect()
    }

    #[test]
    fn dense_circle_is_brought_to_target_count() {
        let cfg = DetectorConfig::default();
        let out = refine_boundary(&circle(400, 50.0), &cfg);
        assert_eq!(out.ring.len(), cfg.target_vertex_count);
        assert!(!out.hull_substituted);
        assert!(validate(&out.ring, cfg.min_contour_area).is_ok());
    }

    #[test]
    fn sparse_hull_keeps_its_area() {
        let cfg = DetectorConfig::default();
        let hull = vec![
            Point2::new(100.0, 100.0),
            Point2::new(299.0, 100.0),
            Point2::new(299.0, 299.0),
            Point2::new(100.0, 299.0),
        ];
        let out = refine_boundary(&hull, &cfg);
        let area = polygon_area(&out.ring);
        assert!((area - 199.0 * 199.0).abs() / (199.0 * 199.0) < 0.02, "area {area}");
        assert_eq!(out.ring.len(), cfg.target_vertex_count);
        assert!(validate(&out.ring, cfg.min_contour_area).is_ok());
    }

    #[test]
    fn bow_tie_is_replaced_by_its_hull() {
        let cfg = DetectorConfig {
            smoothing_window: 0,
            target_vertex_count: 0,
            concavity_threshold: 0.0,
            ..DetectorConfig::default()
        };
        let bow_tie = vec![
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 100.0),
            Point2::new(100.0, 0.0),
            Point2::new(0.0, 100.0),
        ];
        let out = refine_boundary(&bow_tie, &cfg);
        assert!(out.hull_substituted);
        assert_eq!(out.ring.len(), 4);
        assert!(!is_self_intersecting(&out.ring));
    }

    #[test]
    fn small_or_sparse_rings_are_rejected() {
        assert_eq!(
            validate(&circle(6, 50.0), 10.0),
            Err(ValidationError::TooFewVertices { count: 6, min: 10 })
        );
        assert!(matches!(
            validate(&circle(32, 5.0), 400.0),
            Err(ValidationError::AreaTooSmall { .. })
        ));
    }
}
