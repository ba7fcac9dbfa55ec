//! Helpers for callers holding `image` crate buffers.

use crate::core::{self, RgbImageView};
use crate::detector::{DetectError, DetectionRequest, DetectionResult, Detector};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Borrow an `image::RgbImage` as the lightweight `outline-core` view type.
pub fn rgb_view(img: &::image::RgbImage) -> RgbImageView<'_> {
    RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Copy an `outline-core` image (overlay, rectified view) into an
/// `image::RgbImage` for encoding.
pub fn to_image(img: &core::RgbImage) -> Option<::image::RgbImage> {
    ::image::RgbImage::from_raw(img.width as u32, img.height as u32, img.data.clone())
}

/// Run `detector` on an `image::RgbImage`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(detector, img, request), fields(width = img.width(), height = img.height()))
)]
pub fn detect_image(
    detector: &Detector,
    img: &::image::RgbImage,
    request: &DetectionRequest,
) -> Result<DetectionResult, DetectError> {
    detector.detect(&rgb_view(img), request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_and_copy_preserve_pixels() {
        let mut img = ::image::RgbImage::new(3, 2);
        img.put_pixel(2, 1, ::image::Rgb([9, 8, 7]));
        let view = rgb_view(&img);
        assert_eq!((view.width, view.height), (3, 2));
        assert_eq!(view.pixel(2, 1), [9, 8, 7]);

        let owned = core::RgbImage {
            width: 3,
            height: 2,
            data: view.data.to_vec(),
        };
        assert_eq!(to_image(&owned).unwrap(), img);
    }
}
