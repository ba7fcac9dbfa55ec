use outline_contour::{RayCastError, TraceError};
use outline_core::{Expired, InputError};

use super::postprocess::ValidationError;

/// Why a single strategy gave up. Always recovered by moving on to the
/// next strategy, or to the fallback shape on [`StrategyError::Expired`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    #[error("no region between {min} and {max} px found")]
    NoRegion { min: usize, max: usize },
    #[error("boundary trace failed: {0}")]
    Trace(#[from] TraceError),
    #[error("ray casting failed: {0}")]
    RayCast(RayCastError),
    #[error("contour rejected: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Expired(#[from] Expired),
}

impl From<RayCastError> for StrategyError {
    fn from(e: RayCastError) -> Self {
        match e {
            RayCastError::Expired(expired) => Self::Expired(expired),
            other => Self::RayCast(other),
        }
    }
}

/// Errors returned by [`crate::Detector::detect`].
///
/// Only a malformed input image is fatal; every other failure degrades to a
/// fallback result.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error(transparent)]
    Input(#[from] InputError),
}
