//! Optional record of what a detection call did.
//!
//! Collected only when `emit_diagnostics` is set. Nothing in here feeds back
//! into the pipeline.

use nalgebra::Point2;
use outline_calib::{CalibrationModel, MarkerCandidate};
use outline_core::{BinaryMask, Contour, RgbImage};
use serde::{Deserialize, Serialize};

/// One strategy run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub strategy: String,
    pub accepted: bool,
    /// Failure message for rejected attempts.
    pub error: Option<String>,
    pub elapsed_ms: f64,
    /// Vertices of the raw boundary before refinement; 0 when extraction
    /// failed.
    pub raw_vertices: usize,
    pub hull_substituted: bool,
}

/// Intermediate mask kept for inspection.
#[derive(Clone, Debug)]
pub struct StageMask {
    pub stage: String,
    pub mask: BinaryMask,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub chosen_strategy: Option<String>,
    pub attempts: Vec<StrategyAttempt>,
    /// Every recoverable condition met on the way, in order.
    pub events: Vec<String>,
    /// Marker candidates in original-image pixels.
    pub markers: Vec<MarkerCandidate>,
    pub calibration_model: Option<CalibrationModel>,
    /// Processing size divided by original size.
    pub processing_scale: f64,
    pub processed_width: usize,
    pub processed_height: usize,
    pub elapsed_ms: f64,
    #[serde(skip)]
    pub masks: Vec<StageMask>,
    /// Image at processing resolution, the overlay background.
    #[serde(skip)]
    pub processed: Option<RgbImage>,
}

const OUTLINE_COLOR: [u8; 3] = [40, 220, 60];
const MARKER_COLOR: [u8; 3] = [255, 40, 40];
const MASK_TINT: [u8; 3] = [40, 90, 255];

fn blend(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let mix = |x: u8, y: u8| (x as f32 * (1.0 - t) + y as f32 * t).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

fn draw_line(img: &mut RgbImage, a: Point2<f64>, b: Point2<f64>, rgb: [u8; 3]) {
    let (mut x0, mut y0) = (a.x.round() as i64, a.y.round() as i64);
    let (x1, y1) = (b.x.round() as i64, b.y.round() as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        img.put_pixel_checked(x0, y0, rgb);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_cross(img: &mut RgbImage, c: Point2<f64>, arm: f64, rgb: [u8; 3]) {
    draw_line(img, c - nalgebra::Vector2::new(arm, 0.0), c + nalgebra::Vector2::new(arm, 0.0), rgb);
    draw_line(img, c - nalgebra::Vector2::new(0.0, arm), c + nalgebra::Vector2::new(0.0, arm), rgb);
}

impl Diagnostics {
    /// Last mask recorded for `stage`.
    pub fn mask(&self, stage: &str) -> Option<&BinaryMask> {
        self.masks.iter().rev().find(|m| m.stage == stage).map(|m| &m.mask)
    }

    /// Annotated copy of the processed image: the mask of the chosen (or
    /// last tried) strategy tinted blue, marker candidates as red crosses
    /// and `outline` (original-image pixels) in green.
    ///
    /// `None` when no processed image was captured.
    pub fn render_overlay(&self, outline: &Contour) -> Option<RgbImage> {
        let base = self.processed.as_ref()?;
        let mut out = base.clone();

        let mask = self
            .chosen_strategy
            .as_deref()
            .and_then(|s| self.mask(s))
            .or_else(|| self.masks.last().map(|m| &m.mask));
        for y in 0..out.height {
            for x in 0..out.width {
                let p = out.get_pixel(x, y);
                let faded = blend(p, [128, 128, 128], 0.35);
                let tinted = match mask {
                    Some(m) if m.width() == out.width && m.height() == out.height && m.get(x, y) => {
                        blend(faded, MASK_TINT, 0.4)
                    }
                    _ => faded,
                };
                out.put_pixel(x, y, tinted);
            }
        }

        let s = self.processing_scale;
        let scaled = outline.closed().scaled(s);
        for pair in scaled.points.windows(2) {
            draw_line(&mut out, pair[0], pair[1], OUTLINE_COLOR);
        }
        for m in &self.markers {
            draw_cross(&mut out, m.position * s, 6.0, MARKER_COLOR);
        }
        Some(out)
    }
}

/// Diagnostics collection that may be switched off. Events are always
/// logged; they are only stored when collection is on.
pub(crate) struct DiagnosticsSink {
    inner: Option<Diagnostics>,
}

impl DiagnosticsSink {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            inner: enabled.then(Diagnostics::default),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub(crate) fn event(&mut self, message: String) {
        log::warn!("{message}");
        if let Some(d) = &mut self.inner {
            d.events.push(message);
        }
    }

    pub(crate) fn with(&mut self, f: impl FnOnce(&mut Diagnostics)) {
        if let Some(d) = &mut self.inner {
            f(d);
        }
    }

    pub(crate) fn finish(self) -> Option<Diagnostics> {
        self.inner
    }
}
