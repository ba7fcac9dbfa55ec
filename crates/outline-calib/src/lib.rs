//! Marker-based calibration from pixel to real-world coordinates.
//!
//! Three models, tried from richest to simplest by [`calibrate`]:
//! - four markers at the corners of a known rectangle give a planar
//!   homography ([`calibrate_projective`]);
//! - three markers (origin, x-axis, scale) give a similarity transform
//!   ([`calibrate_similarity`]);
//! - otherwise a synthetic identity frame keeps the pipeline running.
//!
//! The resulting [`CalibrationFrame`] converts polygons both ways and drives
//! [`rectify`] for fronto-parallel previews.
//!
//! ```
//! use nalgebra::Point2;
//! use outline_calib::{calibrate, CalibrationModel, CalibrationParams, MarkerCandidate, RealDistances};
//!
//! let markers: Vec<_> = [(100.0, 300.0), (500.0, 300.0), (100.0, 50.0)]
//!     .iter()
//!     .map(|&(x, y)| MarkerCandidate::manual(Point2::new(x, y)))
//!     .collect();
//! let out = calibrate(&markers, &RealDistances::new(400.0, 250.0), &CalibrationParams::default());
//! assert_eq!(out.frame.model, CalibrationModel::Similarity);
//! assert!((out.frame.ratio - 1.0).abs() < 1e-12);
//! ```

mod calibrate;
mod error;
mod frame;
mod markers;
mod params;
mod projective;
mod rectify;
mod similarity;

pub use calibrate::{calibrate, CalibrationOutcome};
pub use error::CalibrationError;
pub use frame::{CalibrationFrame, CalibrationModel};
pub use markers::{assign_roles, find_marker_candidates, order_corners, MarkerCandidate, MarkerRole};
pub use params::{CalibrationParams, MarkerSearchParams, RealDistances};
pub use projective::{calibrate_projective, validate_quad};
pub use rectify::{rectify, RectifyError, MAX_RECTIFIED_SIDE};
pub use similarity::calibrate_similarity;
