#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn write_scene(path: &std::path::Path) {
    let mut img = image::RgbImage::from_pixel(240, 180, image::Rgb([236, 234, 228]));
    for y in 50..130 {
        for x in 70..170 {
            img.put_pixel(x, y, image::Rgb([20, 20, 24]));
        }
    }
    img.save(path).unwrap();
}

#[test]
fn prints_a_detected_report() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("scene.png");
    write_scene(&image);

    Command::cargo_bin("outline")
        .unwrap()
        .args(["--x-distance", "100", "--y-distance", "100", "--timeout-ms", "60000"])
        .arg("--image")
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"detected\""))
        .stdout(predicate::str::contains("seeded_trace"));
}

#[test]
fn writes_report_overlay_and_rectified_view() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("scene.png");
    let report = dir.path().join("report.json");
    let overlay = dir.path().join("overlay.png");
    let rectified = dir.path().join("rectified.png");
    write_scene(&image);

    Command::cargo_bin("outline")
        .unwrap()
        .args(["--x-distance", "100", "--y-distance", "80", "--timeout-ms", "60000"])
        .args(["--marker", "20,20", "--marker", "220,20", "--marker", "220,160", "--marker", "20,160"])
        .args(["--px-per-unit", "1"])
        .arg("--image")
        .arg(&image)
        .arg("--report")
        .arg(&report)
        .arg("--overlay")
        .arg(&overlay)
        .arg("--rectified")
        .arg(&rectified)
        .assert()
        .success();

    let json = std::fs::read_to_string(&report).unwrap();
    assert!(json.contains("\"projective\""));
    assert_eq!(image::image_dimensions(&overlay).unwrap(), (240, 180));
    assert_eq!(image::image_dimensions(&rectified).unwrap(), (100, 80));
}

#[test]
fn missing_image_fails_with_a_message() {
    Command::cargo_bin("outline")
        .unwrap()
        .args(["--image", "does-not-exist.png", "--x-distance", "1", "--y-distance", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open image"));
}

#[test]
fn bad_seed_is_rejected_by_the_parser() {
    Command::cargo_bin("outline")
        .unwrap()
        .args(["--image", "x.png", "--x-distance", "1", "--y-distance", "1", "--seed", "12"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected X,Y"));
}
