use outline_segment::HsvRange;
use serde::{Deserialize, Serialize};

/// Real-world distances between the reference markers, in the caller's unit.
///
/// For three markers `x` is origin → x-axis and `y` is origin → scale; for
/// four markers they are the width and height of the marker rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RealDistances {
    pub x: f64,
    pub y: f64,
}

impl RealDistances {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.x > 0.0 && self.y > 0.0
    }
}

/// Acceptance limits for calibration models.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationParams {
    /// Smallest pixel distance between the markers that define a scale.
    pub min_separation: f64,
    /// Exclusive lower bound on the pixel → real ratio.
    pub min_ratio: f64,
    /// Inclusive upper bound on the pixel → real ratio.
    pub max_ratio: f64,
    /// Shortest accepted side of the 4-marker quad, pixels.
    pub min_side: f64,
    /// Largest accepted ratio between opposite quad sides.
    pub max_side_ratio: f64,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            min_separation: 10.0,
            min_ratio: 0.01,
            max_ratio: 100.0,
            min_side: 10.0,
            max_side_ratio: 10.0,
        }
    }
}

/// How reference markers are searched for in the image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSearchParams {
    /// Marker ink colour.
    pub ranges: Vec<HsvRange>,
    /// Opening kernel applied to the colour mask.
    pub open_kernel: usize,
    pub min_area: usize,
    pub max_area: usize,
    pub min_confidence: f32,
    pub max_candidates: usize,
}

impl Default for MarkerSearchParams {
    fn default() -> Self {
        Self {
            ranges: vec![HsvRange::red()],
            open_kernel: 3,
            min_area: 30,
            max_area: 40_000,
            min_confidence: 0.3,
            max_candidates: 8,
        }
    }
}
