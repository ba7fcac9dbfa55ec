//! JSON report of one detection call.

use std::{fs, path::Path};

use outline_calib::CalibrationFrame;
use outline_core::RealPoint;
use serde::{Deserialize, Serialize};

use crate::config::ConfigIoError;
use crate::detector::{DetectionResult, Diagnostics, FallbackReason};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    Detected,
    Fallback,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectionReport {
    #[serde(default)]
    pub image_path: Option<String>,
    pub image_width: usize,
    pub image_height: usize,
    pub status: DetectionStatus,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub fallback_reason: Option<FallbackReason>,
    /// Closed outline, original-image pixels.
    pub outline_px: Vec<[f64; 2]>,
    /// Closed outline, real units.
    pub outline_real: Vec<RealPoint>,
    pub pixel_area: f64,
    pub real_area: f64,
    pub calibration: CalibrationFrame,
    #[serde(default)]
    pub diagnostics: Option<Diagnostics>,
}

impl DetectionReport {
    pub fn from_result(result: &DetectionResult, image_width: usize, image_height: usize) -> Self {
        let outline = result.outline();
        Self {
            image_path: None,
            image_width,
            image_height,
            status: if result.is_fallback() {
                DetectionStatus::Fallback
            } else {
                DetectionStatus::Detected
            },
            strategy: result.strategy().map(str::to_string),
            fallback_reason: result.fallback_reason(),
            outline_px: outline.pixels.points.iter().map(|p| [p.x, p.y]).collect(),
            outline_real: outline.real.clone(),
            pixel_area: outline.pixel_area(),
            real_area: outline.real_area(),
            calibration: result.frame().clone(),
            diagnostics: result.diagnostics().cloned(),
        }
    }

    pub fn with_image_path(mut self, path: impl Into<String>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
