use nalgebra::Point2;

use crate::error::CalibrationError;
use crate::frame::CalibrationFrame;
use crate::params::{CalibrationParams, RealDistances};

/// Three-marker similarity calibration.
///
/// `ratio = y / |origin - scale|` (real units per pixel) and the orientation
/// is the image angle of `origin → x_axis`. The x-axis distance only feeds a
/// consistency log line.
pub fn calibrate_similarity(
    origin: Point2<f64>,
    x_axis: Point2<f64>,
    scale: Point2<f64>,
    distances: &RealDistances,
    params: &CalibrationParams,
) -> Result<CalibrationFrame, CalibrationError> {
    if !distances.is_valid() {
        return Err(CalibrationError::InvalidDistances {
            x: distances.x,
            y: distances.y,
        });
    }
    let y_sep = nalgebra::distance(&origin, &scale);
    let x_sep = nalgebra::distance(&origin, &x_axis);
    for separation in [y_sep, x_sep] {
        if separation < params.min_separation {
            return Err(CalibrationError::MarkersTooClose {
                separation,
                min: params.min_separation,
            });
        }
    }

    let ratio = distances.y / y_sep;
    if !ratio.is_finite() || ratio <= params.min_ratio || ratio > params.max_ratio {
        return Err(CalibrationError::RatioOutOfRange {
            ratio,
            min: params.min_ratio,
            max: params.max_ratio,
        });
    }
    let orientation = (x_axis.y - origin.y).atan2(x_axis.x - origin.x);

    let x_ratio = distances.x / x_sep;
    if (x_ratio - ratio).abs() > 0.1 * ratio {
        log::warn!(
            "x-axis ratio {x_ratio:.4} disagrees with scale ratio {ratio:.4}; using the scale ratio"
        );
    }
    log::debug!(
        "similarity frame: ratio {ratio:.4}, orientation {:.2} deg",
        orientation.to_degrees()
    );
    Ok(CalibrationFrame::similarity(origin, orientation, ratio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use outline_core::RealPoint;

    #[test]
    fn axis_aligned_markers_give_unit_ratio() {
        let frame = calibrate_similarity(
            Point2::new(100.0, 300.0),
            Point2::new(500.0, 300.0),
            Point2::new(100.0, 50.0),
            &RealDistances::new(400.0, 250.0),
            &CalibrationParams::default(),
        )
        .unwrap();
        assert_relative_eq!(frame.ratio, 1.0);
        assert_relative_eq!(frame.orientation, 0.0);
        assert_eq!(frame.map_pixel(Point2::new(500.0, 300.0)), RealPoint::new(400.0, 0.0));
    }

    #[test]
    fn real_y_points_down_the_image() {
        let frame = calibrate_similarity(
            Point2::new(100.0, 300.0),
            Point2::new(500.0, 300.0),
            Point2::new(100.0, 50.0),
            &RealDistances::new(400.0, 250.0),
            &CalibrationParams::default(),
        )
        .unwrap();
        let scale_marker = frame.map_pixel(Point2::new(100.0, 50.0));
        assert_relative_eq!(scale_marker.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(scale_marker.y, -250.0, epsilon = 1e-9);
        let below = frame.map_pixel(Point2::new(100.0, 400.0));
        assert_relative_eq!(below.y, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn coincident_markers_are_rejected() {
        let err = calibrate_similarity(
            Point2::new(100.0, 300.0),
            Point2::new(500.0, 300.0),
            Point2::new(102.0, 299.0),
            &RealDistances::new(400.0, 250.0),
            &CalibrationParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CalibrationError::MarkersTooClose { .. }));
    }

    #[test]
    fn absurd_ratio_is_rejected() {
        let err = calibrate_similarity(
            Point2::new(0.0, 100.0),
            Point2::new(100.0, 100.0),
            Point2::new(0.0, 0.0),
            &RealDistances::new(1.0e6, 1.0e6),
            &CalibrationParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CalibrationError::RatioOutOfRange { .. }));
        assert!(matches!(
            calibrate_similarity(
                Point2::new(0.0, 100.0),
                Point2::new(100.0, 100.0),
                Point2::new(0.0, 0.0),
                &RealDistances::new(10.0, f64::NAN),
                &CalibrationParams::default(),
            ),
            Err(CalibrationError::InvalidDistances { .. })
        ));
    }
}
