//! Core types and utilities for calibrated outline extraction.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any image decoding crate: callers hand in borrowed raster views,
//! validated once per call, and every later stage trusts them.

mod contour;
mod deadline;
mod error;
mod homography;
mod image;
mod logger;
mod mask;

pub use contour::{perimeter, polygon_area, signed_area, Contour, RealPoint};
pub use deadline::{Deadline, Expired};
pub use error::InputError;
pub use homography::{
    homography_from_4pt, solve_gaussian, warp_perspective_rgb, Homography, HomographyError,
};
pub use image::{
    downscale_rgb, sample_bilinear, sample_bilinear_rgb, to_gray, GrayImage, GrayImageView,
    RgbImage, RgbImageView,
};
pub use mask::BinaryMask;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;

/// Pixel-space point. Real-world coordinates use [`RealPoint`] instead.
pub type PixelPoint = nalgebra::Point2<f64>;
