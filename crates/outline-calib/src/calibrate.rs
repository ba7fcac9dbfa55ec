use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;
use crate::frame::CalibrationFrame;
use crate::markers::{assign_roles, order_corners, MarkerCandidate};
use crate::params::{CalibrationParams, RealDistances};
use crate::projective::calibrate_projective;
use crate::similarity::calibrate_similarity;

/// Frame chosen by [`calibrate`] plus everything that went wrong on the way.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalibrationOutcome {
    pub frame: CalibrationFrame,
    /// Markers that defined the frame, with their roles set.
    pub markers: Vec<MarkerCandidate>,
    /// Errors of the models tried before the accepted one.
    #[serde(skip)]
    pub events: Vec<CalibrationError>,
}

fn most_confident<const N: usize>(candidates: &[MarkerCandidate]) -> Option<[MarkerCandidate; N]> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    sorted.truncate(N);
    sorted.try_into().ok()
}

/// Build the best available frame: 4-marker projective, then 3-marker
/// similarity, then the synthetic identity frame.
///
/// Never fails; every model that could not be built is recorded in
/// [`CalibrationOutcome::events`].
pub fn calibrate(
    candidates: &[MarkerCandidate],
    distances: &RealDistances,
    params: &CalibrationParams,
) -> CalibrationOutcome {
    let mut events = Vec::new();

    if let Some(four) = most_confident::<4>(candidates) {
        let attempt = order_corners(&four).and_then(|corners| {
            let quad = corners.clone().map(|m| m.position);
            calibrate_projective(&quad, distances, params).map(|frame| (frame, corners))
        });
        match attempt {
            Ok((frame, corners)) => {
                log::info!("calibrated with 4-marker projective model");
                return CalibrationOutcome {
                    frame,
                    markers: corners.to_vec(),
                    events,
                };
            }
            Err(e) => {
                log::warn!("projective calibration failed: {e}");
                events.push(e);
            }
        }
    }

    match most_confident::<3>(candidates) {
        Some(three) => {
            let [origin, x_axis, scale] = assign_roles(&three);
            match calibrate_similarity(
                origin.position,
                x_axis.position,
                scale.position,
                distances,
                params,
            ) {
                Ok(frame) => {
                    log::info!("calibrated with 3-marker similarity model");
                    return CalibrationOutcome {
                        frame,
                        markers: vec![origin, x_axis, scale],
                        events,
                    };
                }
                Err(e) => {
                    log::warn!("similarity calibration failed: {e}");
                    events.push(e);
                }
            }
        }
        None => {
            let e = CalibrationError::NotEnoughMarkers {
                found: candidates.len(),
                needed: 3,
            };
            log::warn!("{e}");
            events.push(e);
        }
    }

    log::warn!("falling back to synthetic calibration (1 unit per pixel)");
    CalibrationOutcome {
        frame: CalibrationFrame::synthetic(),
        markers: Vec::new(),
        events,
    }
}
