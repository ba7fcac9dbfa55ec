//! Run a detection call off the caller's thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use outline_core::RgbImage;

use crate::detector::{DetectError, DetectionRequest, DetectionResult, Detector};

/// Spawn one detection call on a dedicated thread.
///
/// The thread owns the image and request; the detector is shared. Join the
/// handle to collect the result. The detector's time budget bounds how long
/// the thread runs.
pub fn spawn_detection(
    detector: Arc<Detector>,
    image: RgbImage,
    request: DetectionRequest,
) -> std::io::Result<JoinHandle<Result<DetectionResult, DetectError>>> {
    thread::Builder::new()
        .name("outline-detect".to_string())
        .spawn(move || detector.detect(&image.view(), &request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;
    use outline_calib::RealDistances;

    #[test]
    fn worker_returns_the_fallback_for_a_blank_image() {
        let detector = Arc::new(Detector::new(DetectorConfig::default()));
        let handle = spawn_detection(
            detector,
            RgbImage::filled(64, 48, [200, 200, 200]),
            DetectionRequest::new(RealDistances::new(10.0, 10.0)),
        )
        .unwrap();
        let result = handle.join().unwrap().unwrap();
        assert!(result.is_fallback());
    }
}
