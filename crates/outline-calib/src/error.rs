use outline_core::HomographyError;

/// Reasons a calibration model could not be built from the markers at hand.
///
/// None of these is fatal to a detection: [`crate::calibrate`] records them
/// and falls back to a simpler model.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("need {needed} markers, found {found}")]
    NotEnoughMarkers { found: usize, needed: usize },
    #[error("real-world distances must be positive and finite (x={x}, y={y})")]
    InvalidDistances { x: f64, y: f64 },
    #[error("markers {separation:.2} px apart, minimum is {min:.2} px")]
    MarkersTooClose { separation: f64, min: f64 },
    #[error("pixel-to-real ratio {ratio} outside ({min}, {max}]")]
    RatioOutOfRange { ratio: f64, min: f64, max: f64 },
    #[error("corner assignment is ambiguous: one marker fills several corners")]
    AmbiguousCorners,
    #[error("marker quad is not convex")]
    NonConvexQuad,
    #[error("quad side {length:.2} px shorter than {min:.2} px")]
    ShortSide { length: f64, min: f64 },
    #[error("opposite quad sides differ by {ratio:.2}:1, limit is {max:.2}:1")]
    SideRatio { ratio: f64, max: f64 },
    #[error(transparent)]
    Homography(#[from] HomographyError),
    #[error("calibration homography is not invertible")]
    NotInvertible,
}
