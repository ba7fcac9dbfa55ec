//! JSON-backed detector configuration.

use std::{fs, path::Path, time::Duration};

use outline_calib::{CalibrationParams, MarkerSearchParams};
use outline_contour::{RayCastParams, DEFAULT_STEP_BUDGET};
use outline_segment::{HsvRange, SegmentationMode};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ConfigIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Segmentation mode used by the primary strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationKind {
    ColorRange,
    Otsu,
    #[default]
    Adaptive,
    Edge,
}

/// Every tunable of one detection call.
///
/// Missing JSON fields take their default, so a config file only needs to
/// list what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub segmentation_mode: SegmentationKind,
    /// Ranges for [`SegmentationKind::ColorRange`].
    pub color_ranges: Vec<HsvRange>,
    /// Odd window of the adaptive threshold, pixels.
    pub adaptive_block_size: usize,
    /// Offset below the local mean for adaptive foreground.
    pub adaptive_c: f64,
    pub edge_low: f32,
    pub edge_high: f32,
    /// Gaussian pre-blur radius applied to the gray image; 0 disables it.
    pub blur_radius: usize,
    pub morph_kernel_size: usize,
    pub simplify_epsilon: f64,
    pub smoothing_window: usize,
    pub smoothing_sigma: f64,
    pub min_blob_size: usize,
    /// Largest accepted component in pixels; `None` means 90% of the image.
    pub max_blob_size: Option<usize>,
    pub angular_step_degrees: f64,
    pub gap_tolerance_min: usize,
    pub gap_tolerance_max: usize,
    /// Wall-clock budget per call, milliseconds (10 s by default).
    pub timeout_budget: u64,
    /// Longest processed image side; larger inputs are downsampled.
    pub max_image_dimension: usize,
    pub emit_diagnostics: bool,
    pub target_vertex_count: usize,
    pub min_contour_area: f64,
    /// Concavity pruning threshold as a fraction of the perimeter.
    pub concavity_threshold: f64,
    /// Global thresholds tried by the sweep strategy.
    pub threshold_sweep: Vec<u8>,
    pub trace_step_budget: usize,
    /// Remaining ray-casting knobs. The angular step and gap tolerances
    /// above override the matching fields.
    pub raycast: RayCastParams,
    pub markers: MarkerSearchParams,
    pub calibration: CalibrationParams,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            segmentation_mode: SegmentationKind::Adaptive,
            color_ranges: vec![HsvRange::dark(0.35)],
            adaptive_block_size: 31,
            adaptive_c: 10.0,
            edge_low: 40.0,
            edge_high: 120.0,
            blur_radius: 2,
            morph_kernel_size: 5,
            simplify_epsilon: 2.0,
            smoothing_window: 5,
            smoothing_sigma: 1.5,
            min_blob_size: 500,
            max_blob_size: None,
            angular_step_degrees: 2.0,
            gap_tolerance_min: 3,
            gap_tolerance_max: 12,
            timeout_budget: 10_000,
            max_image_dimension: 1200,
            emit_diagnostics: false,
            target_vertex_count: 64,
            min_contour_area: 400.0,
            concavity_threshold: 0.08,
            threshold_sweep: vec![60, 90, 120, 150, 180],
            trace_step_budget: DEFAULT_STEP_BUDGET,
            raycast: RayCastParams::default(),
            markers: MarkerSearchParams::default(),
            calibration: CalibrationParams::default(),
        }
    }
}

impl DetectorConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Segmentation mode of the primary strategy.
    pub fn segmentation(&self) -> SegmentationMode {
        match self.segmentation_mode {
            SegmentationKind::ColorRange => SegmentationMode::ColorRange {
                ranges: self.color_ranges.clone(),
            },
            SegmentationKind::Otsu => SegmentationMode::Otsu,
            SegmentationKind::Adaptive => SegmentationMode::Adaptive {
                block_size: self.adaptive_block_size,
                c: self.adaptive_c,
            },
            SegmentationKind::Edge => SegmentationMode::Edge {
                low: self.edge_low,
                high: self.edge_high,
            },
        }
    }

    pub fn ray_cast_params(&self) -> RayCastParams {
        RayCastParams {
            angular_step_deg: self.angular_step_degrees,
            gap_tolerance_min: self.gap_tolerance_min,
            gap_tolerance_max: self.gap_tolerance_max,
            ..self.raycast.clone()
        }
    }

    /// Component size cap for a `width × height` image.
    pub fn max_blob_pixels(&self, width: usize, height: usize) -> usize {
        self.max_blob_size
            .unwrap_or_else(|| (width * height) * 9 / 10)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_budget)
    }
}
