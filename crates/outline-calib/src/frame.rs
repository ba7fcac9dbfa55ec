use nalgebra::{Matrix3, Point2};
use outline_core::{Homography, RealPoint};
use serde::{Deserialize, Serialize};

use crate::params::RealDistances;

/// Which model produced a [`CalibrationFrame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationModel {
    /// Four markers, planar homography.
    Projective,
    /// Three markers: translation, rotation and uniform scale.
    Similarity,
    /// No usable markers; identity mapping with ratio 1.
    Synthetic,
}

/// Immutable pixel ↔ real-world mapping.
///
/// Real axes keep the image handedness: real `x` runs from the origin
/// towards the x-axis marker (or the top-right corner), real `y` is rotated
/// 90° clockwise from it on screen, i.e. it points down the image like pixel
/// `y`. With three markers the scale marker sits above the origin, so it
/// maps to `(0, -y_distance)` and outlines above the x axis get negative
/// real `y`. The four-marker frame uses the same convention (TL at the
/// origin, BL at `(0, y_distance)`), so rectified views are never mirrored.
/// Callers that want a y-up frame negate real `y`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFrame {
    pub model: CalibrationModel,
    /// Pixel position of the real-world origin.
    pub origin: Point2<f64>,
    /// Angle of the real x axis in the image, radians.
    pub orientation: f64,
    /// Real units per pixel. For projective frames this is the average
    /// along the top edge and only informative.
    pub ratio: f64,
    /// Pixel → real homography, present for projective frames.
    pub homography: Option<Homography>,
    inverse: Option<Homography>,
    /// Real-world rectangle spanned by the markers, when known.
    pub extent: Option<RealDistances>,
}

impl CalibrationFrame {
    /// Identity mapping: one real unit per pixel, origin at the image origin.
    pub fn synthetic() -> Self {
        Self {
            model: CalibrationModel::Synthetic,
            origin: Point2::origin(),
            orientation: 0.0,
            ratio: 1.0,
            homography: None,
            inverse: None,
            extent: None,
        }
    }

    pub fn similarity(origin: Point2<f64>, orientation: f64, ratio: f64) -> Self {
        Self {
            model: CalibrationModel::Similarity,
            origin,
            orientation,
            ratio,
            homography: None,
            inverse: None,
            extent: None,
        }
    }

    /// Projective frame; `None` when `pixel_to_real` cannot be inverted.
    pub fn projective(
        pixel_to_real: Homography,
        origin: Point2<f64>,
        orientation: f64,
        ratio: f64,
        extent: RealDistances,
    ) -> Option<Self> {
        let inverse = pixel_to_real.inverse()?;
        Some(Self {
            model: CalibrationModel::Projective,
            origin,
            orientation,
            ratio,
            homography: Some(pixel_to_real),
            inverse: Some(inverse),
            extent: Some(extent),
        })
    }

    pub fn is_synthetic(&self) -> bool {
        self.model == CalibrationModel::Synthetic
    }

    pub fn map_pixel(&self, p: Point2<f64>) -> RealPoint {
        if let Some(h) = &self.homography {
            let q = h.apply(p);
            return RealPoint::new(q.x, q.y);
        }
        let (s, c) = self.orientation.sin_cos();
        let d = p - self.origin;
        RealPoint::new(
            (c * d.x + s * d.y) * self.ratio,
            (-s * d.x + c * d.y) * self.ratio,
        )
    }

    pub fn map_real(&self, r: RealPoint) -> Point2<f64> {
        if let Some(inv) = &self.inverse {
            return inv.apply(Point2::new(r.x, r.y));
        }
        let (s, c) = self.orientation.sin_cos();
        let (x, y) = (r.x / self.ratio, r.y / self.ratio);
        Point2::new(self.origin.x + c * x - s * y, self.origin.y + s * x + c * y)
    }

    pub fn pixel_to_real(&self, points: &[Point2<f64>]) -> Vec<RealPoint> {
        points.iter().map(|&p| self.map_pixel(p)).collect()
    }

    pub fn real_to_pixel(&self, points: &[RealPoint]) -> Vec<Point2<f64>> {
        points.iter().map(|&r| self.map_real(r)).collect()
    }

    /// Real → pixel mapping as a homography, for every model.
    pub fn real_to_pixel_homography(&self) -> Homography {
        if let Some(inv) = self.inverse {
            return inv;
        }
        let (s, c) = self.orientation.sin_cos();
        let k = 1.0 / self.ratio;
        Homography::new(Matrix3::new(
            c * k,
            -s * k,
            self.origin.x,
            s * k,
            c * k,
            self.origin.y,
            0.0,
            0.0,
            1.0,
        ))
    }
}

impl Default for CalibrationFrame {
    fn default() -> Self {
        Self::synthetic()
    }
}
