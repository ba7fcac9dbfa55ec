use nalgebra::Point2;
use outline_calib::CalibrationFrame;
use outline_core::{polygon_area, Contour, RealPoint};
use serde::{Deserialize, Serialize};

use super::diagnostics::Diagnostics;

/// Outline in both coordinate spaces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibratedOutline {
    /// Explicitly closed contour in original-image pixels.
    pub pixels: Contour,
    /// `pixels` mapped through the calibration frame, same order and
    /// closure.
    pub real: Vec<RealPoint>,
}

impl CalibratedOutline {
    pub fn new(pixels: Contour, frame: &CalibrationFrame) -> Self {
        let pixels = pixels.closed();
        let real = frame.pixel_to_real(&pixels.points);
        Self { pixels, real }
    }

    pub fn pixel_area(&self) -> f64 {
        self.pixels.area()
    }

    /// Enclosed area in squared real units.
    pub fn real_area(&self) -> f64 {
        let ring: Vec<Point2<f64>> = self
            .real
            .iter()
            .take(self.real.len().saturating_sub(1))
            .map(|r| Point2::new(r.x, r.y))
            .collect();
        polygon_area(&ring)
    }
}

/// Why the fallback shape was returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The time budget ran out before a strategy succeeded.
    Timeout,
    /// Every strategy failed within the budget.
    NoStrategySucceeded,
}

/// Outcome of one detection call. "Nothing found" is a
/// [`DetectionResult::Fallback`], never an error.
#[derive(Clone, Debug)]
pub enum DetectionResult {
    Detected {
        outline: CalibratedOutline,
        frame: CalibrationFrame,
        strategy: String,
        diagnostics: Option<Diagnostics>,
    },
    Fallback {
        outline: CalibratedOutline,
        frame: CalibrationFrame,
        reason: FallbackReason,
        diagnostics: Option<Diagnostics>,
    },
}

impl DetectionResult {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn outline(&self) -> &CalibratedOutline {
        match self {
            Self::Detected { outline, .. } | Self::Fallback { outline, .. } => outline,
        }
    }

    pub fn frame(&self) -> &CalibrationFrame {
        match self {
            Self::Detected { frame, .. } | Self::Fallback { frame, .. } => frame,
        }
    }

    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Detected { diagnostics, .. } | Self::Fallback { diagnostics, .. } => {
                diagnostics.as_ref()
            }
        }
    }

    /// Name of the accepted strategy, `None` for a fallback.
    pub fn strategy(&self) -> Option<&str> {
        match self {
            Self::Detected { strategy, .. } => Some(strategy),
            Self::Fallback { .. } => None,
        }
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            Self::Detected { .. } => None,
            Self::Fallback { reason, .. } => Some(*reason),
        }
    }
}
