//! Detection strategies.
//!
//! A strategy turns the processed image into a raw boundary ring in two
//! steps: [`Strategy::segment`] produces the foreground it works from and
//! [`Strategy::extract_boundary`] turns that mask into an outline. The
//! detector refines and validates the ring afterwards, so strategies never
//! deal with smoothing or simplification.

use nalgebra::Point2;
use outline_contour::{
    component_near, connected_components, convex_hull, largest_component, polygon_area,
    ray_cast_contour, trace_boundary, Component,
};
use outline_core::{BinaryMask, Deadline, GrayImageView, RgbImageView};
use outline_segment::{close, segment, threshold_mask, SegmentationMode};

use super::error::StrategyError;
use crate::config::DetectorConfig;

/// Inputs shared by every stage of one detection call, at processing
/// resolution.
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    pub rgb: RgbImageView<'a>,
    /// Gray image after the configured pre-blur.
    pub gray: GrayImageView<'a>,
    pub seed: Point2<f64>,
    pub config: &'a DetectorConfig,
    pub deadline: &'a Deadline,
}

impl StageContext<'_> {
    /// Accepted component size range, pixels.
    pub fn blob_range(&self) -> (usize, usize) {
        let max = self.config.max_blob_pixels(self.rgb.width, self.rgb.height);
        (self.config.min_blob_size, max)
    }

    fn components(&self, mask: &BinaryMask) -> Result<Vec<Component>, StrategyError> {
        let (min, max) = self.blob_range();
        Ok(connected_components(mask, min, max, self.deadline)?)
    }

    fn no_region(&self) -> StrategyError {
        let (min, max) = self.blob_range();
        StrategyError::NoRegion { min, max }
    }
}

/// One way of finding the workpiece boundary.
///
/// Implementations must be stateless with respect to a call; the detector
/// shares them across threads.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Foreground mask the boundary is extracted from.
    fn segment(&self, ctx: &StageContext<'_>) -> Result<BinaryMask, StrategyError>;

    /// Raw boundary ring (no closing duplicate) in processing pixels.
    fn extract_boundary(
        &self,
        mask: &BinaryMask,
        ctx: &StageContext<'_>,
    ) -> Result<Vec<Point2<f64>>, StrategyError>;
}

/// Hull of the boundary pixels of `component`.
fn component_hull(component: &Component, width: usize, height: usize) -> Vec<Point2<f64>> {
    let mask = component.to_mask(width, height);
    let edge: Vec<Point2<f64>> = component
        .pixels
        .iter()
        .filter(|&&(x, y)| mask.is_boundary(x, y))
        .map(|&(x, y)| Point2::new(x as f64, y as f64))
        .collect();
    convex_hull(&edge)
}

/// Configured segmentation, closing, the component at or nearest to the
/// seed, and a Moore trace of its outer boundary. Falls back to ray casting
/// from the seed when the trace fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeededTrace;

impl Strategy for SeededTrace {
    fn name(&self) -> &str {
        "seeded_trace"
    }

    fn segment(&self, ctx: &StageContext<'_>) -> Result<BinaryMask, StrategyError> {
        let mode = ctx.config.segmentation();
        let mask = segment(&ctx.rgb, &ctx.gray, &mode, ctx.deadline)?;
        ctx.deadline.check()?;
        Ok(close(&mask, ctx.config.morph_kernel_size))
    }

    fn extract_boundary(
        &self,
        mask: &BinaryMask,
        ctx: &StageContext<'_>,
    ) -> Result<Vec<Point2<f64>>, StrategyError> {
        let components = ctx.components(mask)?;
        let region = component_near(components, (ctx.seed.x, ctx.seed.y))
            .ok_or_else(|| ctx.no_region())?;
        let region_mask = region.to_mask(mask.width(), mask.height());

        match trace_boundary(&region_mask, region.start, ctx.config.trace_step_budget) {
            Ok(ring) => Ok(ring),
            Err(e) => {
                log::warn!("{}: trace failed ({e}), ray casting instead", self.name());
                ctx.deadline.check()?;
                let (sx, sy) = (ctx.seed.x.round() as i64, ctx.seed.y.round() as i64);
                let origin = if region_mask.get_signed(sx, sy) {
                    ctx.seed
                } else {
                    let (cx, cy) = region.centroid();
                    Point2::new(cx, cy)
                };
                Ok(ray_cast_contour(
                    &region_mask,
                    origin,
                    &ctx.config.ray_cast_params(),
                    ctx.deadline,
                )?)
            }
        }
    }
}

/// Global thresholds from `threshold_sweep`; the largest component of each
/// is scored and the best one is wrapped in its convex hull.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThresholdSweep;

/// Higher is better: solid regions near the image centre win.
fn sweep_score(component: &Component, hull_area: f64, width: usize, height: usize) -> f64 {
    let solidity = if hull_area > 0.0 {
        (component.len() as f64 / hull_area).min(1.0)
    } else {
        0.0
    };
    let (cx, cy) = component.centroid();
    let dx = (cx - width as f64 / 2.0) / width as f64;
    let dy = (cy - height as f64 / 2.0) / height as f64;
    let centrality = (1.0 - 2.0 * (dx * dx + dy * dy).sqrt()).max(0.0);
    0.6 * solidity + 0.4 * centrality
}

impl Strategy for ThresholdSweep {
    fn name(&self) -> &str {
        "threshold_sweep"
    }

    fn segment(&self, ctx: &StageContext<'_>) -> Result<BinaryMask, StrategyError> {
        let (w, h) = (ctx.gray.width, ctx.gray.height);
        let mut best: Option<(f64, u8, Component)> = None;
        for &t in &ctx.config.threshold_sweep {
            let mask = close(&threshold_mask(&ctx.gray, t, ctx.deadline)?, ctx.config.morph_kernel_size);
            let Some(region) = largest_component(ctx.components(&mask)?) else {
                log::debug!("{}: threshold {t} left no usable region", self.name());
                continue;
            };
            let hull_area = polygon_area(&component_hull(&region, w, h));
            let score = sweep_score(&region, hull_area, w, h);
            log::debug!(
                "{}: threshold {t} -> {} px, score {score:.3}",
                self.name(),
                region.len()
            );
            if best.as_ref().is_none_or(|(s, _, _)| score > *s) {
                best = Some((score, t, region));
            }
        }
        let (score, t, region) = best.ok_or_else(|| ctx.no_region())?;
        log::debug!("{}: picked threshold {t} (score {score:.3})", self.name());
        Ok(region.to_mask(w, h))
    }

    fn extract_boundary(
        &self,
        mask: &BinaryMask,
        ctx: &StageContext<'_>,
    ) -> Result<Vec<Point2<f64>>, StrategyError> {
        let region = largest_component(ctx.components(mask)?).ok_or_else(|| ctx.no_region())?;
        Ok(component_hull(&region, mask.width(), mask.height()))
    }
}

/// Global Otsu threshold, largest component, convex hull.
#[derive(Clone, Copy, Debug, Default)]
pub struct OtsuHull;

impl Strategy for OtsuHull {
    fn name(&self) -> &str {
        "otsu_hull"
    }

    fn segment(&self, ctx: &StageContext<'_>) -> Result<BinaryMask, StrategyError> {
        let mask = segment(&ctx.rgb, &ctx.gray, &SegmentationMode::Otsu, ctx.deadline)?;
        ctx.deadline.check()?;
        Ok(close(&mask, ctx.config.morph_kernel_size))
    }

    fn extract_boundary(
        &self,
        mask: &BinaryMask,
        ctx: &StageContext<'_>,
    ) -> Result<Vec<Point2<f64>>, StrategyError> {
        let region = largest_component(ctx.components(mask)?).ok_or_else(|| ctx.no_region())?;
        Ok(component_hull(&region, mask.width(), mask.height()))
    }
}

/// Strategies in escalation order.
pub fn default_strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(SeededTrace),
        Box::new(ThresholdSweep),
        Box::new(OtsuHull),
    ]
}
