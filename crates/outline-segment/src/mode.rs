use crate::edges::hysteresis_edges;
use crate::hsv::{color_range_mask, HsvRange};
use crate::threshold::{adaptive_mask, histogram, otsu_threshold, threshold_mask};
use outline_core::{BinaryMask, Deadline, Expired, GrayImageView, RgbImageView};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One way of turning an image into a foreground mask.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentationMode {
    /// Pixels inside any of the HSV ranges.
    ColorRange { ranges: Vec<HsvRange> },
    /// Global Otsu threshold, dark side is foreground.
    Otsu,
    /// Local mean threshold.
    Adaptive { block_size: usize, c: f64 },
    /// Sobel magnitude with hysteresis.
    Edge { low: f32, high: f32 },
}

impl Default for SegmentationMode {
    fn default() -> Self {
        Self::Adaptive {
            block_size: 31,
            c: 10.0,
        }
    }
}

impl SegmentationMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ColorRange { .. } => "color_range",
            Self::Otsu => "otsu",
            Self::Adaptive { .. } => "adaptive",
            Self::Edge { .. } => "edge",
        }
    }
}

/// Segment with the given mode.
///
/// `rgb` is only read by [`SegmentationMode::ColorRange`]; every other mode
/// works on `gray`, which callers may have blurred beforehand. Both views
/// must have the same dimensions.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(rgb, gray, deadline),
        fields(mode = mode.name(), width = gray.width, height = gray.height)
    )
)]
pub fn segment(
    rgb: &RgbImageView<'_>,
    gray: &GrayImageView<'_>,
    mode: &SegmentationMode,
    deadline: &Deadline,
) -> Result<BinaryMask, Expired> {
    let mask = match mode {
        SegmentationMode::ColorRange { ranges } => color_range_mask(rgb, ranges, deadline)?,
        SegmentationMode::Otsu => {
            let t = otsu_threshold(&histogram(gray));
            log::debug!("otsu threshold {t}");
            threshold_mask(gray, t, deadline)?
        }
        SegmentationMode::Adaptive { block_size, c } => {
            adaptive_mask(gray, *block_size, *c, deadline)?
        }
        SegmentationMode::Edge { low, high } => hysteresis_edges(gray, *low, *high, deadline)?,
    };
    log::debug!(
        "{} segmentation: {} of {} pixels foreground",
        mode.name(),
        mask.count(),
        mask.width() * mask.height()
    );
    Ok(mask)
}
