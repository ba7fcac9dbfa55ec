//! High-level facade for calibrated workpiece outline extraction.
//!
//! This crate provides:
//! - re-exports of the underlying crates (`core`, `segment`, `contour`,
//!   `calib`);
//! - the [`Detector`], which escalates through segmentation strategies and
//!   always returns an outline, falling back to a fixed polygon when
//!   nothing is found or the time budget runs out;
//! - JSON configuration ([`DetectorConfig`]) and reports
//!   ([`DetectionReport`]);
//! - (feature `image`) adapters from `image::RgbImage`.
//!
//! ## Quickstart
//!
//! ```
//! use outline::calib::RealDistances;
//! use outline::core::RgbImage;
//! use outline::{DetectionRequest, Detector, DetectorConfig};
//!
//! let mut img = RgbImage::filled(200, 200, [235, 235, 235]);
//! for y in 60..140 {
//!     for x in 50..150 {
//!         img.put_pixel(x, y, [25, 25, 25]);
//!     }
//! }
//!
//! let detector = Detector::new(DetectorConfig::default());
//! let request = DetectionRequest::new(RealDistances::new(100.0, 100.0));
//! let result = detector.detect(&img.view(), &request)?;
//! assert!(!result.is_fallback());
//! println!("area: {:.0} px²", result.outline().pixel_area());
//! # Ok::<(), outline::DetectError>(())
//! ```
//!
//! ## API map
//! - `outline::core`: image views, masks, contours, homographies, deadlines.
//! - `outline::segment`: segmentation modes and morphology.
//! - `outline::contour`: components, tracing, ray casting, polygon helpers.
//! - `outline::calib`: marker candidates and calibration frames.
//! - `outline::detect` (feature `image`): helpers over `image::RgbImage`.

pub use outline_calib as calib;
pub use outline_contour as contour;
pub use outline_core as core;
pub use outline_segment as segment;

mod config;
mod detector;
mod report;
mod worker;

pub use config::{ConfigIoError, DetectorConfig, SegmentationKind};
pub use detector::{
    default_strategies, fallback_shape, processing_scale, refine_boundary, validate,
    CalibratedOutline, DetectError, DetectionRequest, DetectionResult, Detector, Diagnostics,
    FallbackReason, OtsuHull, RefinedBoundary, SeededTrace, StageContext, StageMask, Strategy,
    StrategyAttempt, StrategyError, ThresholdSweep, ValidationError, FALLBACK_RADIUS_FRACTION,
    FALLBACK_VERTICES, MIN_OUTLINE_VERTICES,
};
pub use report::{DetectionReport, DetectionStatus};
pub use worker::spawn_detection;

#[cfg(feature = "image")]
pub mod detect;
