use nalgebra::Point2;
use outline_core::homography_from_4pt;

use crate::error::CalibrationError;
use crate::frame::CalibrationFrame;
use crate::params::{CalibrationParams, RealDistances};

fn cross_z(o: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Reject quads that would give an unstable homography: non-convex or
/// self-crossing winding, very short sides, or wildly different opposite
/// sides.
pub fn validate_quad(
    quad: &[Point2<f64>; 4],
    params: &CalibrationParams,
) -> Result<(), CalibrationError> {
    let turns: Vec<f64> = (0..4)
        .map(|i| cross_z(quad[i], quad[(i + 1) % 4], quad[(i + 2) % 4]))
        .collect();
    let all_pos = turns.iter().all(|&t| t > 0.0);
    let all_neg = turns.iter().all(|&t| t < 0.0);
    if !(all_pos || all_neg) {
        return Err(CalibrationError::NonConvexQuad);
    }

    let sides: Vec<f64> = (0..4)
        .map(|i| nalgebra::distance(&quad[i], &quad[(i + 1) % 4]))
        .collect();
    if let Some(&length) = sides.iter().find(|&&s| s < params.min_side) {
        return Err(CalibrationError::ShortSide {
            length,
            min: params.min_side,
        });
    }
    for (a, b) in [(sides[0], sides[2]), (sides[1], sides[3])] {
        let ratio = a.max(b) / a.min(b);
        if ratio > params.max_side_ratio {
            return Err(CalibrationError::SideRatio {
                ratio,
                max: params.max_side_ratio,
            });
        }
    }
    Ok(())
}

/// Four-marker projective calibration.
///
/// `quad` is `[top_left, top_right, bottom_right, bottom_left]` in pixels; it
/// maps onto the real rectangle `(0,0) (x,0) (x,y) (0,y)`.
pub fn calibrate_projective(
    quad: &[Point2<f64>; 4],
    distances: &RealDistances,
    params: &CalibrationParams,
) -> Result<CalibrationFrame, CalibrationError> {
    if !distances.is_valid() {
        return Err(CalibrationError::InvalidDistances {
            x: distances.x,
            y: distances.y,
        });
    }
    validate_quad(quad, params)?;

    let rect = [
        Point2::new(0.0, 0.0),
        Point2::new(distances.x, 0.0),
        Point2::new(distances.x, distances.y),
        Point2::new(0.0, distances.y),
    ];
    let h = homography_from_4pt(quad, &rect)?;

    let top = quad[1] - quad[0];
    let orientation = top.y.atan2(top.x);
    let ratio = distances.x / top.norm();
    log::debug!(
        "projective frame: top-edge ratio {ratio:.4}, orientation {:.2} deg",
        orientation.to_degrees()
    );
    CalibrationFrame::projective(h, quad[0], orientation, ratio, *distances)
        .ok_or(CalibrationError::NotInvertible)
}
