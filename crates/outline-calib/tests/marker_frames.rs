use approx::assert_relative_eq;
use nalgebra::Point2;
use outline_calib::{
    calibrate, find_marker_candidates, CalibrationModel, CalibrationParams, MarkerRole,
    MarkerSearchParams, RealDistances,
};
use outline_core::{Deadline, RealPoint, RgbImage};

fn paint_disk(img: &mut RgbImage, cx: i64, cy: i64, r: i64) {
    for y in cy - r..=cy + r {
        for x in cx - r..=cx + r {
            if (x - cx).pow(2) + (y - cy).pow(2) <= r * r {
                img.put_pixel_checked(x, y, [215, 20, 25]);
            }
        }
    }
}

#[test]
fn three_painted_markers_give_unit_scale() {
    let mut img = RgbImage::filled(640, 400, [240, 238, 232]);
    paint_disk(&mut img, 100, 300, 9);
    paint_disk(&mut img, 500, 300, 9);
    paint_disk(&mut img, 100, 50, 9);

    let candidates =
        find_marker_candidates(&img.view(), &MarkerSearchParams::default(), &Deadline::unbounded())
            .unwrap();
    assert_eq!(candidates.len(), 3);

    let out = calibrate(
        &candidates,
        &RealDistances::new(400.0, 250.0),
        &CalibrationParams::default(),
    );
    assert_eq!(out.frame.model, CalibrationModel::Similarity);
    assert_relative_eq!(out.frame.ratio, 1.0, epsilon = 1e-3);
    assert_relative_eq!(out.frame.orientation, 0.0, epsilon = 1e-3);

    let origin = out
        .markers
        .iter()
        .find(|m| m.role == Some(MarkerRole::Origin))
        .unwrap();
    assert_relative_eq!(origin.position.x, 100.0, epsilon = 0.5);
    assert_relative_eq!(origin.position.y, 300.0, epsilon = 0.5);
}

#[test]
fn trapezoid_of_four_markers_maps_to_rectangle_corners() {
    let corners = [
        (150.0, 100.0),
        (450.0, 100.0),
        (550.0, 400.0),
        (50.0, 400.0),
    ];
    let markers: Vec<_> = corners
        .iter()
        .rev()
        .map(|&(x, y)| outline_calib::MarkerCandidate::manual(Point2::new(x, y)))
        .collect();
    let out = calibrate(
        &markers,
        &RealDistances::new(210.0, 297.0),
        &CalibrationParams::default(),
    );
    assert_eq!(out.frame.model, CalibrationModel::Projective);

    let pixels: Vec<Point2<f64>> = corners.iter().map(|&(x, y)| Point2::new(x, y)).collect();
    let real = out.frame.pixel_to_real(&pixels);
    let expected = [
        RealPoint::new(0.0, 0.0),
        RealPoint::new(210.0, 0.0),
        RealPoint::new(210.0, 297.0),
        RealPoint::new(0.0, 297.0),
    ];
    for (r, e) in real.iter().zip(expected) {
        assert_relative_eq!(r.x, e.x, epsilon = 1e-6);
        assert_relative_eq!(r.y, e.y, epsilon = 1e-6);
    }

    let back = out.frame.real_to_pixel(&real);
    for (b, p) in back.iter().zip(&pixels) {
        assert_relative_eq!(b.x, p.x, epsilon = 1e-6);
        assert_relative_eq!(b.y, p.y, epsilon = 1e-6);
    }
}
