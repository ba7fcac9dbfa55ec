//! Binary segmentation and mask morphology.
//!
//! Every segmentation mode turns an image into a [`BinaryMask`] of the same
//! size. Intensity-based modes treat *dark* pixels as foreground: the
//! expected scene is a dark workpiece photographed on light paper.
//!
//! ```
//! use outline_core::{to_gray, Deadline, RgbImage};
//! use outline_segment::{close, segment, SegmentationMode};
//!
//! let img = RgbImage::filled(32, 32, [240, 240, 240]);
//! let gray = to_gray(&img.view());
//! let mask = segment(&img.view(), &gray.view(), &SegmentationMode::Otsu, &Deadline::unbounded())?;
//! let cleaned = close(&mask, 3);
//! assert_eq!(cleaned.width(), 32);
//! # Ok::<(), outline_core::Expired>(())
//! ```

mod blur;
mod edges;
mod hsv;
mod mode;
mod morphology;
mod threshold;

pub use blur::gaussian_blur;
pub use edges::{hysteresis_edges, sobel_magnitude};
pub use hsv::{color_range_mask, rgb_to_hsv, HsvRange};
pub use mode::{segment, SegmentationMode};
pub use morphology::{close, dilate, erode, open};
pub use threshold::{adaptive_mask, histogram, otsu_threshold, threshold_mask};

pub use outline_core::BinaryMask;
