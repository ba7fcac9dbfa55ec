use outline_core::{BinaryMask, Deadline, Expired, RgbImageView};
use serde::{Deserialize, Serialize};

/// Inclusive HSV box. Hue is in degrees `[0, 360)`, saturation and value in
/// `[0, 1]`.
///
/// When `hue_min > hue_max` the hue interval wraps through 0°, which is how
/// reds are expressed (e.g. `340..=20`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HsvRange {
    pub hue_min: f32,
    pub hue_max: f32,
    pub sat_min: f32,
    pub sat_max: f32,
    pub val_min: f32,
    pub val_max: f32,
}

impl HsvRange {
    /// Dark pixels of any hue.
    pub fn dark(val_max: f32) -> Self {
        Self {
            hue_min: 0.0,
            hue_max: 360.0,
            sat_min: 0.0,
            sat_max: 1.0,
            val_min: 0.0,
            val_max,
        }
    }

    /// Saturated red, wrapping through 0°.
    pub fn red() -> Self {
        Self {
            hue_min: 340.0,
            hue_max: 20.0,
            sat_min: 0.45,
            sat_max: 1.0,
            val_min: 0.25,
            val_max: 1.0,
        }
    }

    #[inline]
    pub fn contains(&self, h: f32, s: f32, v: f32) -> bool {
        let hue_ok = if self.hue_min > self.hue_max {
            h >= self.hue_min || h <= self.hue_max
        } else {
            h >= self.hue_min && h <= self.hue_max
        };
        hue_ok
            && (self.sat_min..=self.sat_max).contains(&s)
            && (self.val_min..=self.val_max).contains(&v)
    }
}

/// RGB to (hue degrees, saturation, value).
#[inline]
pub fn rgb_to_hsv(rgb: [u8; 3]) -> (f32, f32, f32) {
    let r = rgb[0] as f32 / 255.0;
    let g = rgb[1] as f32 / 255.0;
    let b = rgb[2] as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta <= f32::EPSILON {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max <= f32::EPSILON { 0.0 } else { delta / max };
    (h.rem_euclid(360.0), s, max)
}

/// Foreground where the pixel falls in any of `ranges` (checked in order).
pub fn color_range_mask(
    img: &RgbImageView<'_>,
    ranges: &[HsvRange],
    deadline: &Deadline,
) -> Result<BinaryMask, Expired> {
    let mut mask = BinaryMask::new(img.width, img.height);
    if ranges.is_empty() {
        return Ok(mask);
    }
    for y in 0..img.height {
        deadline.check()?;
        for x in 0..img.width {
            let (h, s, v) = rgb_to_hsv(img.pixel(x, y));
            if ranges.iter().any(|r| r.contains(h, s, v)) {
                mask.set(x, y, true);
            }
        }
    }
    Ok(mask)
}
