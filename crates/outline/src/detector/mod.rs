//! Outline detection pipeline.
//!
//! This module wires together segmentation, boundary extraction, geometric
//! refinement and calibration, escalating through the configured strategies
//! and finishing with a fallback polygon when all of them fail.

mod diagnostics;
mod error;
mod fallback;
mod pipeline;
mod postprocess;
mod result;
mod strategy;

pub use diagnostics::{Diagnostics, StageMask, StrategyAttempt};
pub use error::{DetectError, StrategyError};
pub use fallback::{fallback_shape, FALLBACK_RADIUS_FRACTION, FALLBACK_VERTICES};
pub use pipeline::{processing_scale, DetectionRequest, Detector};
pub use postprocess::{refine_boundary, validate, RefinedBoundary, ValidationError, MIN_OUTLINE_VERTICES};
pub use result::{CalibratedOutline, DetectionResult, FallbackReason};
pub use strategy::{default_strategies, OtsuHull, SeededTrace, StageContext, Strategy, ThresholdSweep};
