//! Moore-neighbour boundary tracing.

use nalgebra::Point2;
use outline_core::BinaryMask;

/// Default cap on trace steps.
pub const DEFAULT_STEP_BUDGET: usize = 10_000;

/// Clockwise on screen (y down): E, SE, S, SW, W, NW, N, NE.
const DIRS: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("start pixel ({x}, {y}) is background")]
    StartNotForeground { x: usize, y: usize },
    #[error("start pixel ({x}, {y}) is outside the {width}x{height} mask")]
    StartOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[error("start pixel ({x}, {y}) has no background neighbour")]
    StartNotOnBoundary { x: usize, y: usize },
    #[error("boundary did not close within {budget} steps")]
    StepBudgetExceeded { budget: usize },
}

/// Trace the 8-connected outer boundary through `start`.
///
/// `start` should be the raster-first pixel of its region (topmost, then
/// leftmost), as reported by [`crate::connected_components`]: the sweep
/// then begins from its west neighbour, which is known to be outside. Other
/// starts sweep from the first background neighbour followed clockwise by
/// foreground.
///
/// Returns pixel centres in clockwise screen order, without repeating the
/// start pixel. An isolated pixel yields a single point. The trace ends when
/// it leaves `start` in the same direction as its first step, so pixels the
/// boundary passes twice (one-pixel necks) are visited on both sides.
/// Running past `step_budget` steps is an error, never a truncated result.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(mask), fields(width = mask.width(), height = mask.height()))
)]
pub fn trace_boundary(
    mask: &BinaryMask,
    start: (usize, usize),
    step_budget: usize,
) -> Result<Vec<Point2<f64>>, TraceError> {
    let (sx, sy) = start;
    if sx >= mask.width() || sy >= mask.height() {
        return Err(TraceError::StartOutOfBounds {
            x: sx,
            y: sy,
            width: mask.width(),
            height: mask.height(),
        });
    }
    if !mask.get(sx, sy) {
        return Err(TraceError::StartNotForeground { x: sx, y: sy });
    }

    let fg = |x: i64, y: i64| mask.get_signed(x, y);
    let (sx, sy) = (sx as i64, sy as i64);
    let background = |d: usize| !fg(sx + DIRS[d].0, sy + DIRS[d].1);

    const WEST: usize = 4;
    let backtrack = if background(WEST) {
        WEST
    } else {
        (0..8)
            .find(|&d| background(d) && !background((d + 1) % 8))
            .ok_or(TraceError::StartNotOnBoundary {
                x: start.0,
                y: start.1,
            })?
    };

    // First foreground neighbour clockwise from `search`.
    let next_step = |x: i64, y: i64, search: usize| {
        (0..8).map(|i| (search + i) % 8).find(|&d| {
            let (dx, dy) = DIRS[d];
            fg(x + dx, y + dy)
        })
    };

    let mut points = vec![Point2::new(sx as f64, sy as f64)];
    let Some(first) = next_step(sx, sy, (backtrack + 1) % 8) else {
        // isolated pixel
        return Ok(points);
    };

    let (mut cx, mut cy, mut d) = (sx, sy, first);
    for _ in 0..step_budget {
        cx += DIRS[d].0;
        cy += DIRS[d].1;
        // The pixel we came from is foreground, so a step always exists.
        let next = next_step(cx, cy, (d + 5) % 8).unwrap_or((d + 4) % 8);
        if cx == sx && cy == sy && next == first {
            return Ok(points);
        }
        points.push(Point2::new(cx as f64, cy as f64));
        d = next;
    }

    log::debug!(
        "trace from ({}, {}) exceeded {step_budget} steps",
        start.0,
        start.1
    );
    Err(TraceError::StepBudgetExceeded {
        budget: step_budget,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use outline_core::polygon_area;

    fn rect_mask(w: usize, h: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> BinaryMask {
        BinaryMask::from_fn(w, h, |x, y| (x0..x1).contains(&x) && (y0..y1).contains(&y))
    }

    #[test]
    fn rectangle_boundary_runs_through_pixel_centres() {
        let mask = rect_mask(10, 10, 2, 3, 7, 6);
        let pts = trace_boundary(&mask, (2, 3), DEFAULT_STEP_BUDGET).unwrap();
        // 5x3 block: perimeter pixels = 2*5 + 2*1
        assert_eq!(pts.len(), 12);
        assert_eq!(pts[0], Point2::new(2.0, 3.0));
        assert_eq!(pts[1], Point2::new(3.0, 3.0));
        assert!((polygon_area(&pts) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn isolated_pixel_is_a_single_point() {
        let mut mask = BinaryMask::new(5, 5);
        mask.set(2, 2, true);
        let pts = trace_boundary(&mask, (2, 2), DEFAULT_STEP_BUDGET).unwrap();
        assert_eq!(pts, vec![Point2::new(2.0, 2.0)]);
    }

    #[test]
    fn background_and_interior_starts_are_rejected() {
        let mask = rect_mask(8, 8, 1, 1, 6, 6);
        assert_eq!(
            trace_boundary(&mask, (0, 0), 100),
            Err(TraceError::StartNotForeground { x: 0, y: 0 })
        );
        assert_eq!(
            trace_boundary(&mask, (3, 3), 100),
            Err(TraceError::StartNotOnBoundary { x: 3, y: 3 })
        );
    }

    #[test]
    fn exhausted_budget_is_an_error() {
        let mask = rect_mask(50, 50, 5, 5, 45, 45);
        assert_eq!(
            trace_boundary(&mask, (5, 5), 20),
            Err(TraceError::StepBudgetExceeded { budget: 20 })
        );
    }

    #[test]
    fn notch_beside_the_start_does_not_cut_the_trace_short() {
        // start (1, 0) has foreground east and south but a background
        // south-east notch
        let mask = BinaryMask::from_fn(21, 21, |x, y| match y {
            0 => x == 1 || x == 2,
            1 => x <= 1,
            _ => true,
        });
        let pts = trace_boundary(&mask, (1, 0), DEFAULT_STEP_BUDGET).unwrap();
        assert_eq!(pts[0], Point2::new(1.0, 0.0));
        assert_eq!(pts[1], Point2::new(2.0, 0.0));
        assert!(pts.contains(&Point2::new(20.0, 20.0)));
        assert!(pts.contains(&Point2::new(0.0, 20.0)));
        assert!(polygon_area(&pts) > 350.0, "area {}", polygon_area(&pts));
    }

    #[test]
    fn start_on_a_one_pixel_neck_is_passed_twice() {
        // two single-pixel arms hanging off the start pixel
        let mask = BinaryMask::from_fn(3, 3, |x, y| match y {
            0 => x == 1,
            _ => x != 1,
        });
        let pts = trace_boundary(&mask, (1, 0), DEFAULT_STEP_BUDGET).unwrap();
        assert_eq!(
            pts,
            vec![
                Point2::new(1.0, 0.0),
                Point2::new(2.0, 1.0),
                Point2::new(2.0, 2.0),
                Point2::new(2.0, 1.0),
                Point2::new(1.0, 0.0),
                Point2::new(0.0, 1.0),
                Point2::new(0.0, 2.0),
                Point2::new(0.0, 1.0),
            ]
        );
    }

    #[test]
    fn diagonal_steps_follow_a_staircase() {
        let mask = BinaryMask::from_fn(6, 6, |x, y| x <= y && y < 5);
        let pts = trace_boundary(&mask, (0, 0), DEFAULT_STEP_BUDGET).unwrap();
        assert_eq!(pts[1], Point2::new(1.0, 1.0));
        assert!(pts.contains(&Point2::new(4.0, 4.0)));
        assert!(pts.contains(&Point2::new(0.0, 4.0)));
    }
}
