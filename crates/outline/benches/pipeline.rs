use criterion::{black_box, criterion_group, criterion_main, Criterion};
use outline::calib::RealDistances;
use outline::core::{to_gray, Deadline, RgbImage};
use outline::segment::{adaptive_mask, close};
use outline::{DetectionRequest, Detector, DetectorConfig};

fn scene(width: usize, height: usize) -> RgbImage {
    let mut img = RgbImage::filled(width, height, [236, 234, 228]);
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
    let r = width.min(height) as f64 * 0.3;
    for y in 0..height {
        for x in 0..width {
            let (dx, dy) = (x as f64 - cx, y as f64 - cy);
            // lobed blob so tracing has concave detail to follow
            let angle = dy.atan2(dx);
            let reach = r * (1.0 + 0.2 * (5.0 * angle).cos());
            if (dx * dx + dy * dy).sqrt() < reach {
                img.put_pixel(x, y, [30, 28, 32]);
            }
        }
    }
    img
}

fn bench_pipeline(c: &mut Criterion) {
    let img = scene(1024, 768);
    let request = DetectionRequest::new(RealDistances::new(200.0, 150.0));
    let detector = Detector::new(DetectorConfig {
        timeout_budget: 60_000,
        ..DetectorConfig::default()
    });

    c.bench_function("detect_1024x768", |b| {
        b.iter(|| black_box(detector.detect(black_box(&img.view()), &request)))
    });

    let gray = to_gray(&img.view());
    let deadline = Deadline::unbounded();
    c.bench_function("adaptive_close_1024x768", |b| {
        b.iter(|| {
            let mask = adaptive_mask(black_box(&gray.view()), 31, 10.0, &deadline);
            black_box(mask.map(|m| close(&m, 5)))
        })
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
