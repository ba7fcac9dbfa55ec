use nalgebra::Point2;
use outline_contour::{connected_components, Component};
use outline_core::{Deadline, Expired, RgbImageView};
use outline_segment::{color_range_mask, open};
use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;
use crate::params::MarkerSearchParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Fill ratio of a disk inscribed in its bounding box.
const DISK_FILL: f32 = std::f32::consts::FRAC_PI_4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerRole {
    Origin,
    XAxis,
    Scale,
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerCandidate {
    /// Pixel centre.
    pub position: Point2<f64>,
    pub role: Option<MarkerRole>,
    /// In `[0, 1]`.
    pub confidence: f32,
    /// Blob size in pixels; 0 for caller-supplied markers.
    pub area: usize,
}

impl MarkerCandidate {
    /// Marker position supplied by the caller, trusted fully.
    pub fn manual(position: Point2<f64>) -> Self {
        Self {
            position,
            role: None,
            confidence: 1.0,
            area: 0,
        }
    }
}

fn blob_confidence(c: &Component) -> f32 {
    let (w, h) = (c.bbox.width() as f32, c.bbox.height() as f32);
    let fill = c.len() as f32 / (w * h);
    let fill_score = (1.0 - (fill - DISK_FILL).abs() / DISK_FILL).clamp(0.0, 1.0);
    let aspect = w.min(h) / w.max(h);
    (0.6 * fill_score + 0.4 * aspect).clamp(0.0, 1.0)
}

/// Find marker-coloured blobs and score how marker-like they are.
///
/// Confidence mixes how closely the blob fills its bounding box like a disk
/// would and how square that box is. Results are sorted by confidence and
/// capped at `params.max_candidates`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(image, params, deadline), fields(width = image.width, height = image.height))
)]
pub fn find_marker_candidates(
    image: &RgbImageView<'_>,
    params: &MarkerSearchParams,
    deadline: &Deadline,
) -> Result<Vec<MarkerCandidate>, Expired> {
    let mask = color_range_mask(image, &params.ranges, deadline)?;
    let mask = open(&mask, params.open_kernel);
    let blobs = connected_components(&mask, params.min_area, params.max_area, deadline)?;

    let mut out: Vec<MarkerCandidate> = blobs
        .iter()
        .map(|b| {
            let (cx, cy) = b.centroid();
            MarkerCandidate {
                position: Point2::new(cx, cy),
                role: None,
                confidence: blob_confidence(b),
                area: b.len(),
            }
        })
        .filter(|m| m.confidence >= params.min_confidence)
        .collect();
    out.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    out.truncate(params.max_candidates);
    log::debug!(
        "{} marker blobs, {} candidates kept",
        blobs.len(),
        out.len()
    );
    Ok(out)
}

/// Assign origin, x-axis and scale roles to three markers.
///
/// The topmost marker is the scale marker; of the other two the leftmost is
/// the origin and the rightmost the x-axis marker. Returns
/// `[origin, x_axis, scale]`.
pub fn assign_roles(markers: &[MarkerCandidate; 3]) -> [MarkerCandidate; 3] {
    let mut by_y = markers.clone();
    by_y.sort_by(|a, b| {
        a.position
            .y
            .total_cmp(&b.position.y)
            .then(a.position.x.total_cmp(&b.position.x))
    });
    let [scale, a, b] = by_y;
    let (mut origin, mut x_axis) = if a.position.x <= b.position.x {
        (a, b)
    } else {
        (b, a)
    };
    let mut scale = scale;
    origin.role = Some(MarkerRole::Origin);
    x_axis.role = Some(MarkerRole::XAxis);
    scale.role = Some(MarkerRole::Scale);
    [origin, x_axis, scale]
}

/// Order four markers as `[top_left, top_right, bottom_right, bottom_left]`.
///
/// TL minimises `x + y`, BR maximises it, TR maximises `x - y` and BL
/// minimises it. One marker winning two corners is an error.
pub fn order_corners(
    markers: &[MarkerCandidate; 4],
) -> Result<[MarkerCandidate; 4], CalibrationError> {
    let sum = |m: &MarkerCandidate| m.position.x + m.position.y;
    let diff = |m: &MarkerCandidate| m.position.x - m.position.y;
    let pick = |key: &dyn Fn(&MarkerCandidate) -> f64, max: bool| -> usize {
        let mut best = 0;
        for i in 1..4 {
            let better = if max {
                key(&markers[i]) > key(&markers[best])
            } else {
                key(&markers[i]) < key(&markers[best])
            };
            if better {
                best = i;
            }
        }
        best
    };

    let idx = [
        pick(&sum, false),
        pick(&diff, true),
        pick(&sum, true),
        pick(&diff, false),
    ];
    for i in 0..4 {
        for j in i + 1..4 {
            if idx[i] == idx[j] {
                return Err(CalibrationError::AmbiguousCorners);
            }
        }
    }
    let roles = [
        MarkerRole::TopLeft,
        MarkerRole::TopRight,
        MarkerRole::BottomRight,
        MarkerRole::BottomLeft,
    ];
    Ok(std::array::from_fn(|k| {
        let mut m = markers[idx[k]].clone();
        m.role = Some(roles[k]);
        m
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use outline_core::RgbImage;

    fn at(x: f64, y: f64) -> MarkerCandidate {
        MarkerCandidate::manual(Point2::new(x, y))
    }

    fn paint_disk(img: &mut RgbImage, cx: i64, cy: i64, r: i64, rgb: [u8; 3]) {
        for y in cy - r..=cy + r {
            for x in cx - r..=cx + r {
                if (x - cx).pow(2) + (y - cy).pow(2) <= r * r {
                    img.put_pixel_checked(x, y, rgb);
                }
            }
        }
    }

    #[test]
    fn roles_follow_vertical_then_horizontal_rule() {
        let [origin, x_axis, scale] = assign_roles(&[at(500.0, 300.0), at(100.0, 50.0), at(100.0, 300.0)]);
        assert_eq!(origin.position, Point2::new(100.0, 300.0));
        assert_eq!(x_axis.position, Point2::new(500.0, 300.0));
        assert_eq!(scale.position, Point2::new(100.0, 50.0));
        assert_eq!(scale.role, Some(MarkerRole::Scale));
    }

    #[test]
    fn corners_are_ordered_geometrically() {
        let ordered = order_corners(&[
            at(580.0, 420.0),
            at(120.0, 80.0),
            at(60.0, 400.0),
            at(520.0, 100.0),
        ])
        .unwrap();
        let pos: Vec<_> = ordered.iter().map(|m| (m.position.x, m.position.y)).collect();
        assert_eq!(pos, vec![(120.0, 80.0), (520.0, 100.0), (580.0, 420.0), (60.0, 400.0)]);
        assert_eq!(ordered[3].role, Some(MarkerRole::BottomLeft));
    }

    #[test]
    fn collinear_corners_are_ambiguous() {
        let err = order_corners(&[at(0.0, 0.0), at(10.0, 10.0), at(20.0, 20.0), at(30.0, 30.0)])
            .unwrap_err();
        assert_eq!(err, CalibrationError::AmbiguousCorners);
    }

    #[test]
    fn red_disks_are_found_and_a_red_bar_scores_lower() {
        let mut img = RgbImage::filled(200, 120, [235, 235, 230]);
        paint_disk(&mut img, 40, 40, 8, [210, 25, 30]);
        paint_disk(&mut img, 150, 80, 8, [200, 30, 40]);
        for y in 100..104 {
            for x in 20..120 {
                img.put_pixel(x, y, [210, 25, 30]);
            }
        }
        // dark blob is not marker ink
        paint_disk(&mut img, 100, 40, 10, [20, 20, 20]);

        let cands =
            find_marker_candidates(&img.view(), &MarkerSearchParams::default(), &Deadline::unbounded())
                .unwrap();
        assert!(cands.len() >= 2);
        let top_two: Vec<_> = cands.iter().take(2).map(|c| c.position).collect();
        assert!(top_two.iter().any(|p| (p.x - 40.0).abs() < 1.0 && (p.y - 40.0).abs() < 1.0));
        assert!(top_two.iter().any(|p| (p.x - 150.0).abs() < 1.0 && (p.y - 80.0).abs() < 1.0));
        assert!(cands[0].confidence > 0.8);
        assert!(cands.iter().all(|c| (c.position.x - 100.0).abs() > 5.0 || (c.position.y - 40.0).abs() > 5.0));
    }
}
