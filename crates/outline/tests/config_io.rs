use outline::calib::RealDistances;
use outline::core::RgbImage;
use outline::{
    DetectionReport, DetectionRequest, DetectionStatus, Detector, DetectorConfig,
    SegmentationKind,
};
use tempfile::tempdir;

#[test]
fn config_survives_a_json_round_trip_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("detector.json");

    let config = DetectorConfig {
        segmentation_mode: SegmentationKind::Edge,
        threshold_sweep: vec![70, 140],
        max_blob_size: Some(12_345),
        ..DetectorConfig::default()
    };
    config.write_json(&path).unwrap();
    let loaded = DetectorConfig::load_json(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn malformed_config_is_a_json_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        DetectorConfig::load_json(&path),
        Err(outline::ConfigIoError::Json(_))
    ));
    assert!(matches!(
        DetectorConfig::load_json(dir.path().join("missing.json")),
        Err(outline::ConfigIoError::Io(_))
    ));
}

#[test]
fn report_is_written_and_read_back() {
    let img = RgbImage::filled(80, 60, [200, 200, 200]);
    let detector = Detector::new(DetectorConfig {
        emit_diagnostics: true,
        ..DetectorConfig::default()
    });
    let result = detector
        .detect(&img.view(), &DetectionRequest::new(RealDistances::new(5.0, 5.0)))
        .unwrap();

    let report = DetectionReport::from_result(&result, 80, 60).with_image_path("blank.png");
    assert_eq!(report.status, DetectionStatus::Fallback);
    assert_eq!(report.outline_px.len(), report.outline_real.len());

    let dir = tempdir().unwrap();
    let path = dir.path().join("report.json");
    report.write_json(&path).unwrap();
    let back = DetectionReport::load_json(&path).unwrap();
    assert_eq!(back.status, DetectionStatus::Fallback);
    assert_eq!(back.image_path.as_deref(), Some("blank.png"));
    assert_eq!(back.outline_px, report.outline_px);
    assert_eq!(back.calibration, report.calibration);
    assert_eq!(back.diagnostics.map(|d| d.attempts.len()), Some(3));
}
