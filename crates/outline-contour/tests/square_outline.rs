use nalgebra::Point2;
use outline_contour::{
    connected_components, largest_component, polygon_area, resample, simplify_closed, smooth,
    trace_boundary, DEFAULT_STEP_BUDGET,
};
use outline_core::{BinaryMask, Deadline};

fn centred_square(canvas: usize, side: usize) -> BinaryMask {
    let lo = (canvas - side) / 2;
    let hi = lo + side;
    BinaryMask::from_fn(canvas, canvas, |x, y| (lo..hi).contains(&x) && (lo..hi).contains(&y))
}

#[test]
fn traced_square_area_is_within_one_percent() {
    let mask = centred_square(400, 200);
    let comps = connected_components(&mask, 100, usize::MAX, &Deadline::unbounded()).unwrap();
    let square = largest_component(comps).expect("one component");
    assert_eq!(square.len(), 40_000);
    assert_eq!(square.start, (100, 100));

    let boundary = trace_boundary(&mask, square.start, DEFAULT_STEP_BUDGET).unwrap();
    let area = polygon_area(&boundary);
    assert!(
        (area - 40_000.0).abs() / 40_000.0 < 0.01,
        "traced area {area}"
    );

    let simplified = simplify_closed(&boundary, 3.0);
    assert!(
        (4..=8).contains(&simplified.len()),
        "{} vertices",
        simplified.len()
    );
    assert!(simplified.contains(&Point2::new(100.0, 100.0)));
    assert!(simplified.contains(&Point2::new(299.0, 299.0)));
}

#[test]
fn post_processing_keeps_square_shape() {
    let mask = centred_square(120, 60);
    let boundary = trace_boundary(&mask, (30, 30), DEFAULT_STEP_BUDGET).unwrap();
    let smoothed = smooth(&boundary, 5, 1.0);
    let simplified = simplify_closed(&smoothed, 1.5);
    let resampled = resample(&simplified, 32);
    assert_eq!(resampled.len(), 32);
    let area = polygon_area(&resampled);
    assert!((area - 59.0 * 59.0).abs() / (59.0 * 59.0) < 0.05, "area {area}");
}
