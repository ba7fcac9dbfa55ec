use nalgebra::{Matrix3, Point2};
use outline_core::{warp_perspective_rgb, Deadline, Expired, Homography, RealPoint, RgbImage, RgbImageView};

use crate::frame::CalibrationFrame;

/// Largest side of a rectified image, in pixels.
pub const MAX_RECTIFIED_SIDE: usize = 8192;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RectifyError {
    #[error("pixels per unit must be positive and finite, got {0}")]
    InvalidScale(f64),
    #[error("rectified image of {width}x{height} px exceeds {MAX_RECTIFIED_SIDE} px per side")]
    TooLarge { width: usize, height: usize },
    #[error(transparent)]
    Expired(#[from] Expired),
}

/// Real-world rectangle covered by the output: the marker rectangle when the
/// frame knows it, otherwise the real bounding box of the image corners.
fn real_window(frame: &CalibrationFrame, width: usize, height: usize) -> (RealPoint, RealPoint) {
    if let Some(extent) = frame.extent {
        return (RealPoint::new(0.0, 0.0), RealPoint::new(extent.x, extent.y));
    }
    let corners = [
        Point2::new(0.0, 0.0),
        Point2::new(width as f64 - 1.0, 0.0),
        Point2::new(width as f64 - 1.0, height as f64 - 1.0),
        Point2::new(0.0, height as f64 - 1.0),
    ];
    let real = frame.pixel_to_real(&corners);
    let min = RealPoint::new(
        real.iter().map(|p| p.x).fold(f64::INFINITY, f64::min),
        real.iter().map(|p| p.y).fold(f64::INFINITY, f64::min),
    );
    let max = RealPoint::new(
        real.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max),
        real.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max),
    );
    (min, max)
}

/// Resample `image` into a fronto-parallel view with `px_per_unit` output
/// pixels per real unit.
///
/// Output pixel `(u, v)` shows real point `min + (u, v) / px_per_unit`;
/// every output pixel is pulled back through the frame's real → pixel
/// mapping and sampled bilinearly. Pixels that fall outside the source stay
/// black.
pub fn rectify(
    image: &RgbImageView<'_>,
    frame: &CalibrationFrame,
    px_per_unit: f64,
    deadline: &Deadline,
) -> Result<RgbImage, RectifyError> {
    if !px_per_unit.is_finite() || px_per_unit <= 0.0 {
        return Err(RectifyError::InvalidScale(px_per_unit));
    }
    let (min, max) = real_window(frame, image.width, image.height);
    let width = ((max.x - min.x) * px_per_unit).round().max(1.0) as usize;
    let height = ((max.y - min.y) * px_per_unit).round().max(1.0) as usize;
    if width > MAX_RECTIFIED_SIDE || height > MAX_RECTIFIED_SIDE {
        return Err(RectifyError::TooLarge { width, height });
    }

    let k = 1.0 / px_per_unit;
    let out_to_real = Matrix3::new(k, 0.0, min.x, 0.0, k, min.y, 0.0, 0.0, 1.0);
    let dst_to_src = Homography::new(frame.real_to_pixel_homography().h * out_to_real);
    log::debug!("rectifying into {width}x{height} px at {px_per_unit} px/unit");
    Ok(warp_perspective_rgb(image, &dst_to_src, width, height, deadline)?)
}
