//! Star-shaped boundary estimation by casting rays from a seed.
//!
//! Used when Moore tracing fails on fragmented masks: rays tolerate gaps in
//! the foreground, and a second pass of short ray fans from points next to
//! suspicious vertices recovers concave detail the first pass misses.

use nalgebra::{Point2, Vector2};
use outline_core::{polygon_area, BinaryMask, Deadline, Expired};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Inward offset of re-seeding origins from their vertex, in pixels.
const RESEED_INSET: f64 = 3.0;
/// Largest ring searched when moving the seed off the boundary.
const SEED_SEARCH_RADIUS: i64 = 64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RayCastParams {
    /// Angle between neighbouring rays, degrees.
    pub angular_step_deg: f64,
    /// Background steps allowed before the first foreground hit.
    pub gap_tolerance_min: usize,
    /// Background run bridged once the ray is inside the region.
    pub gap_tolerance_max: usize,
    /// Extra distance searched past the last hit; foreground found there
    /// only extends the ray when it is a solid run of `gap_tolerance_min`
    /// pixels.
    pub continue_search_distance: f64,
    /// Turning angle (degrees) that marks a vertex for re-seeding.
    pub curvature_threshold_deg: f64,
    /// Edge length (pixels) that marks a vertex for re-seeding.
    pub gap_distance_threshold: f64,
    pub max_reseed_vertices: usize,
    pub outlier_iqr_factor: f64,
    pub neighbor_distance_factor: f64,
    /// Ray length cap; `None` uses the mask diagonal.
    pub max_radius: Option<f64>,
    pub min_vertices: usize,
    pub min_area: f64,
}

impl Default for RayCastParams {
    fn default() -> Self {
        Self {
            angular_step_deg: 2.0,
            gap_tolerance_min: 3,
            gap_tolerance_max: 12,
            continue_search_distance: 20.0,
            curvature_threshold_deg: 45.0,
            gap_distance_threshold: 25.0,
            max_reseed_vertices: 8,
            outlier_iqr_factor: 1.5,
            neighbor_distance_factor: 3.0,
            max_radius: None,
            min_vertices: 8,
            min_area: 100.0,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RayCastError {
    #[error("no foreground within {radius} px of seed ({x:.1}, {y:.1})")]
    NoForegroundNearSeed { x: f64, y: f64, radius: i64 },
    #[error("ray casting produced {count} vertices, need {min}")]
    TooFewVertices { count: usize, min: usize },
    #[error("ray-cast polygon area {area:.1} below minimum {min:.1}")]
    AreaTooSmall { area: f64, min: f64 },
    #[error(transparent)]
    Expired(#[from] Expired),
}

/// Move `seed` onto an interior foreground pixel.
///
/// Seeds on background or on the region boundary are replaced by the nearest
/// interior pixel found on square rings of growing radius. A boundary seed
/// with no interior pixel nearby is kept as is.
pub fn adjust_seed(mask: &BinaryMask, seed: Point2<f64>) -> Result<Point2<f64>, RayCastError> {
    let (sx, sy) = (seed.x.round() as i64, seed.y.round() as i64);
    let interior = |x: i64, y: i64| mask.get_signed(x, y) && !mask.is_boundary(x as usize, y as usize);
    if interior(sx, sy) {
        return Ok(Point2::new(sx as f64, sy as f64));
    }

    for r in 1..=SEED_SEARCH_RADIUS {
        let mut best: Option<(i64, i64, i64)> = None;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx.abs() != r && dy.abs() != r {
                    continue;
                }
                let (x, y) = (sx + dx, sy + dy);
                if interior(x, y) {
                    let d2 = dx * dx + dy * dy;
                    if best.is_none_or(|(_, _, b)| d2 < b) {
                        best = Some((x, y, d2));
                    }
                }
            }
        }
        if let Some((x, y, _)) = best {
            log::debug!("seed moved from ({sx}, {sy}) to interior pixel ({x}, {y})");
            return Ok(Point2::new(x as f64, y as f64));
        }
    }

    if mask.get_signed(sx, sy) {
        return Ok(Point2::new(sx as f64, sy as f64));
    }
    Err(RayCastError::NoForegroundNearSeed {
        x: seed.x,
        y: seed.y,
        radius: SEED_SEARCH_RADIUS,
    })
}

/// Walk one ray outward and return the distance of its last accepted
/// foreground sample.
fn cast_ray(
    mask: &BinaryMask,
    origin: Point2<f64>,
    angle: f64,
    max_radius: f64,
    params: &RayCastParams,
) -> Option<f64> {
    let dir = Vector2::new(angle.cos(), angle.sin());
    let solid_run = params.gap_tolerance_min.max(1);
    let mut last: Option<f64> = None;
    let mut gap = 0usize;
    let mut pending = 0usize;

    let steps = max_radius.ceil() as usize;
    for step in 1..=steps {
        let r = step as f64;
        let p = origin + dir * r;
        let (px, py) = (p.x.round() as i64, p.y.round() as i64);
        if px < 0 || py < 0 || px >= mask.width() as i64 || py >= mask.height() as i64 {
            break;
        }
        if mask.get(px as usize, py as usize) {
            match last {
                Some(_) if gap > params.gap_tolerance_max => {
                    pending += 1;
                    if pending >= solid_run {
                        last = Some(r);
                        gap = 0;
                        pending = 0;
                    }
                }
                _ => {
                    last = Some(r);
                    gap = 0;
                }
            }
        } else {
            gap += 1;
            pending = 0;
            match last {
                None if gap > params.gap_tolerance_min => return None,
                Some(l)
                    if gap > params.gap_tolerance_max
                        && r - l > params.continue_search_distance =>
                {
                    break
                }
                _ => {}
            }
        }
    }
    last
}

fn cast_fan(
    mask: &BinaryMask,
    origin: Point2<f64>,
    angles: impl Iterator<Item = f64>,
    max_radius: f64,
    params: &RayCastParams,
    deadline: &Deadline,
) -> Result<Vec<Point2<f64>>, Expired> {
    let mut hits = Vec::new();
    for angle in angles {
        deadline.check()?;
        if let Some(r) = cast_ray(mask, origin, angle, max_radius, params) {
            hits.push(origin + Vector2::new(angle.cos(), angle.sin()) * r);
        }
    }
    Ok(hits)
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Drop points whose distance from `center` falls outside the
/// interquartile fence `[Q1 - f*IQR, Q3 + f*IQR]`.
pub fn reject_outliers(points: &mut Vec<Point2<f64>>, center: Point2<f64>, factor: f64) {
    if points.len() < 4 {
        return;
    }
    let mut d: Vec<f64> = points.iter().map(|p| nalgebra::distance(p, &center)).collect();
    d.sort_by(f64::total_cmp);
    let q1 = quantile(&d, 0.25);
    let q3 = quantile(&d, 0.75);
    // Ray hits sit on integer radii; keep the fence at least a pixel wide.
    let iqr = (q3 - q1).max(1.0);
    let (lo, hi) = (q1 - factor * iqr, q3 + factor * iqr);
    let before = points.len();
    points.retain(|p| {
        let r = nalgebra::distance(p, &center);
        r >= lo && r <= hi
    });
    if points.len() != before {
        log::debug!("outlier fence [{lo:.1}, {hi:.1}] dropped {} points", before - points.len());
    }
}

fn sort_by_angle(points: &mut [Point2<f64>], center: Point2<f64>) {
    points.sort_by(|a, b| {
        let ta = (a.y - center.y).atan2(a.x - center.x);
        let tb = (b.y - center.y).atan2(b.x - center.x);
        ta.total_cmp(&tb)
    });
}

/// Vertices worth a second look, most suspicious first.
fn reseed_candidates(ring: &[Point2<f64>], params: &RayCastParams) -> Vec<usize> {
    let n = ring.len();
    if n < 3 {
        return Vec::new();
    }
    let mut scored: Vec<(usize, f64)> = (0..n)
        .filter_map(|i| {
            let prev = ring[(i + n - 1) % n];
            let cur = ring[i];
            let next = ring[(i + 1) % n];
            let a = cur - prev;
            let b = next - cur;
            let gap = b.norm();
            let turn = if a.norm() > 1e-9 && gap > 1e-9 {
                a.angle(&b).to_degrees()
            } else {
                0.0
            };
            let priority = (turn / params.curvature_threshold_deg.max(1e-9))
                .max(gap / params.gap_distance_threshold.max(1e-9));
            (turn > params.curvature_threshold_deg || gap > params.gap_distance_threshold)
                .then_some((i, priority))
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
        .into_iter()
        .take(params.max_reseed_vertices)
        .map(|(i, _)| i)
        .collect()
}

/// Drop vertices far from both polygon neighbours relative to the mean edge.
fn filter_by_neighbours(ring: &mut Vec<Point2<f64>>, factor: f64) {
    let n = ring.len();
    if n < 4 {
        return;
    }
    let mean_edge = (0..n)
        .map(|i| nalgebra::distance(&ring[i], &ring[(i + 1) % n]))
        .sum::<f64>()
        / n as f64;
    let limit = factor * mean_edge;
    let keep: Vec<bool> = (0..n)
        .map(|i| {
            let d_prev = nalgebra::distance(&ring[i], &ring[(i + n - 1) % n]);
            let d_next = nalgebra::distance(&ring[i], &ring[(i + 1) % n]);
            !(d_prev > limit && d_next > limit)
        })
        .collect();
    let mut it = keep.iter();
    ring.retain(|_| it.next().copied().unwrap_or(true));
}

/// Estimate the region boundary around `seed` by ray casting.
///
/// The returned ring is sorted by angle around the (adjusted) seed and is not
/// explicitly closed.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(mask, params, deadline), fields(width = mask.width(), height = mask.height()))
)]
pub fn ray_cast_contour(
    mask: &BinaryMask,
    seed: Point2<f64>,
    params: &RayCastParams,
    deadline: &Deadline,
) -> Result<Vec<Point2<f64>>, RayCastError> {
    let center = adjust_seed(mask, seed)?;
    let max_radius = params.max_radius.unwrap_or_else(|| {
        ((mask.width() * mask.width() + mask.height() * mask.height()) as f64).sqrt()
    });
    let step = params.angular_step_deg.clamp(0.1, 90.0).to_radians();
    let n_rays = (std::f64::consts::TAU / step).round().max(3.0) as usize;

    let angles = (0..n_rays).map(|i| i as f64 * std::f64::consts::TAU / n_rays as f64);
    let mut ring = cast_fan(mask, center, angles, max_radius, params, deadline)?;
    reject_outliers(&mut ring, center, params.outlier_iqr_factor);
    sort_by_angle(&mut ring, center);
    log::debug!("primary ray pass: {} hits from {n_rays} rays", ring.len());

    let candidates = reseed_candidates(&ring, params);
    if !candidates.is_empty() {
        let mut extra = Vec::new();
        for &i in &candidates {
            let v = ring[i];
            let out = v - center;
            if out.norm() < 1e-9 {
                continue;
            }
            let out = out.normalize();
            let origin = v - out * RESEED_INSET;
            let base = out.y.atan2(out.x);
            let half = std::f64::consts::FRAC_PI_2;
            let fan_rays = (2.0 * half / step).floor() as usize;
            let fan = (0..=fan_rays).map(|k| base - half + k as f64 * step);
            extra.extend(cast_fan(mask, origin, fan, max_radius, params, deadline)?);
        }
        log::debug!(
            "re-seeded {} vertices, {} extra hits",
            candidates.len(),
            extra.len()
        );
        ring.extend(extra);
        reject_outliers(&mut ring, center, params.outlier_iqr_factor);
        sort_by_angle(&mut ring, center);
        filter_by_neighbours(&mut ring, params.neighbor_distance_factor);
    }

    if ring.len() < params.min_vertices {
        return Err(RayCastError::TooFewVertices {
            count: ring.len(),
            min: params.min_vertices,
        });
    }
    let area = polygon_area(&ring);
    if area < params.min_area {
        return Err(RayCastError::AreaTooSmall {
            area,
            min: params.min_area,
        });
    }
    Ok(ring)
}
