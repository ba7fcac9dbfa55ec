use std::time::Instant;

use nalgebra::Point2;
use outline_calib::{calibrate, find_marker_candidates, MarkerCandidate, RealDistances};
use outline_contour::polygon_area;
use outline_core::{downscale_rgb, to_gray, Contour, Deadline, RgbImage, RgbImageView};
use outline_segment::gaussian_blur;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::diagnostics::{DiagnosticsSink, StageMask, StrategyAttempt};
use super::fallback::fallback_shape;
use super::postprocess::{refine_boundary, validate};
use super::strategy::{default_strategies, StageContext, Strategy};
use super::{
    CalibratedOutline, DetectError, DetectionResult, FallbackReason, StrategyError,
};
use crate::config::DetectorConfig;

/// Per-call inputs besides the image.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionRequest {
    pub distances: RealDistances,
    /// Point on or near the workpiece, original-image pixels. Defaults to
    /// the image centre.
    pub seed: Option<Point2<f64>>,
    /// Marker positions in original-image pixels. When `None` the markers
    /// are searched for in the image.
    pub markers: Option<Vec<Point2<f64>>>,
}

impl DetectionRequest {
    pub fn new(distances: RealDistances) -> Self {
        Self {
            distances,
            seed: None,
            markers: None,
        }
    }

    pub fn with_seed(mut self, seed: Point2<f64>) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_markers(mut self, markers: Vec<Point2<f64>>) -> Self {
        self.markers = Some(markers);
        self
    }
}

/// Multi-strategy outline detector.
///
/// Strategies run in order until one yields a contour that survives
/// refinement and validation; when none does, or the time budget runs out,
/// a fallback polygon is returned instead. Only a malformed image is an
/// error.
pub struct Detector {
    config: DetectorConfig,
    strategies: Vec<Box<dyn Strategy>>,
}

impl Detector {
    /// Detector with the built-in strategies: seeded trace, threshold
    /// sweep, Otsu hull.
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            strategies: default_strategies(),
        }
    }

    /// Detector with an explicit strategy list.
    pub fn with_strategies(config: DetectorConfig, strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { config, strategies }
    }

    /// Append a strategy after the existing ones.
    pub fn with_strategy(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    #[inline]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Detect the workpiece outline and calibrate it.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, image, request),
            fields(width = image.width, height = image.height)
        )
    )]
    pub fn detect(
        &self,
        image: &RgbImageView<'_>,
        request: &DetectionRequest,
    ) -> Result<DetectionResult, DetectError> {
        let image = RgbImageView::new(image.width, image.height, image.data)?;
        let started = Instant::now();
        let deadline = Deadline::after(self.config.timeout());
        let mut sink = DiagnosticsSink::new(self.config.emit_diagnostics);

        let (w, h) = (image.width, image.height);
        let seed = request
            .seed
            .unwrap_or_else(|| Point2::new(w as f64 / 2.0, h as f64 / 2.0));
        let scale = processing_scale(w, h, self.config.max_image_dimension);

        let processed = match self.downscale(&image, scale, &deadline) {
            Ok(p) => p,
            Err(reason) => {
                sink.event(reason);
                let frame = self.calibrate(request, None, scale, &deadline, &mut sink);
                return Ok(self.fallback(seed, w, h, frame, FallbackReason::Timeout, sink, started));
            }
        };
        let view = processed.as_ref().map_or(image, |p| p.view());
        sink.with(|d| {
            d.processing_scale = scale;
            d.processed_width = view.width;
            d.processed_height = view.height;
            d.processed = Some(processed.clone().unwrap_or_else(|| RgbImage {
                width: view.width,
                height: view.height,
                data: view.data.to_vec(),
            }));
        });

        let frame = self.calibrate(request, Some(&view), scale, &deadline, &mut sink);

        let gray = to_gray(&view);
        let blurred = match gaussian_blur(&gray.view(), self.config.blur_radius, &deadline) {
            Ok(b) => b,
            Err(e) => {
                sink.event(format!("pre-blur abandoned: {e}"));
                return Ok(self.fallback(seed, w, h, frame, FallbackReason::Timeout, sink, started));
            }
        };
        let ctx = StageContext {
            rgb: view,
            gray: blurred.view(),
            seed: Point2::new(seed.x * scale, seed.y * scale),
            config: &self.config,
            deadline: &deadline,
        };

        for strategy in &self.strategies {
            let name = strategy.name().to_string();
            let attempt_started = Instant::now();
            let outcome = self.run_strategy(strategy.as_ref(), &ctx, &mut sink);
            let elapsed_ms = attempt_started.elapsed().as_secs_f64() * 1e3;

            match outcome {
                Ok((ring, raw_vertices, hull_substituted)) => {
                    log::info!(
                        "strategy {name} accepted: {} vertices, area {:.0} px² ({elapsed_ms:.1} ms)",
                        ring.len(),
                        polygon_area(&ring)
                    );
                    sink.with(|d| {
                        d.attempts.push(StrategyAttempt {
                            strategy: name.clone(),
                            accepted: true,
                            error: None,
                            elapsed_ms,
                            raw_vertices,
                            hull_substituted,
                        });
                        d.chosen_strategy = Some(name.clone());
                        d.elapsed_ms = started.elapsed().as_secs_f64() * 1e3;
                    });
                    let pixels = Contour::new(ring).scaled(1.0 / scale);
                    return Ok(DetectionResult::Detected {
                        outline: CalibratedOutline::new(pixels, &frame),
                        frame,
                        strategy: name,
                        diagnostics: sink.finish(),
                    });
                }
                Err((e, raw_vertices)) => {
                    sink.event(format!("strategy {name} failed: {e}"));
                    sink.with(|d| {
                        d.attempts.push(StrategyAttempt {
                            strategy: name.clone(),
                            accepted: false,
                            error: Some(e.to_string()),
                            elapsed_ms,
                            raw_vertices,
                            hull_substituted: false,
                        })
                    });
                    if matches!(e, StrategyError::Expired(_)) {
                        return Ok(self.fallback(seed, w, h, frame, FallbackReason::Timeout, sink, started));
                    }
                }
            }
        }

        Ok(self.fallback(
            seed,
            w,
            h,
            frame,
            FallbackReason::NoStrategySucceeded,
            sink,
            started,
        ))
    }

    /// Downscaled copy when `scale < 1`, `None` when the image is used as is.
    fn downscale(
        &self,
        image: &RgbImageView<'_>,
        scale: f64,
        deadline: &Deadline,
    ) -> Result<Option<RgbImage>, String> {
        if scale >= 1.0 {
            return Ok(None);
        }
        let out_w = ((image.width as f64 * scale).round() as usize).max(1);
        let out_h = ((image.height as f64 * scale).round() as usize).max(1);
        log::debug!(
            "downsampling {}x{} -> {out_w}x{out_h}",
            image.width,
            image.height
        );
        downscale_rgb(image, out_w, out_h, deadline)
            .map(Some)
            .map_err(|e| format!("downsampling abandoned: {e}"))
    }

    /// Frame from caller markers, or from markers found in `processed`.
    fn calibrate(
        &self,
        request: &DetectionRequest,
        processed: Option<&RgbImageView<'_>>,
        scale: f64,
        deadline: &Deadline,
        sink: &mut DiagnosticsSink,
    ) -> outline_calib::CalibrationFrame {
        let candidates: Vec<MarkerCandidate> = match (&request.markers, processed) {
            (Some(points), _) => points.iter().copied().map(MarkerCandidate::manual).collect(),
            (None, Some(view)) => match find_marker_candidates(view, &self.config.markers, deadline) {
                Ok(found) => found
                    .into_iter()
                    .map(|mut c| {
                        c.position = Point2::new(c.position.x / scale, c.position.y / scale);
                        c
                    })
                    .collect(),
                Err(e) => {
                    sink.event(format!("marker search abandoned: {e}"));
                    Vec::new()
                }
            },
            (None, None) => Vec::new(),
        };

        let outcome = calibrate(&candidates, &request.distances, &self.config.calibration);
        for e in &outcome.events {
            sink.event(format!("calibration: {e}"));
        }
        sink.with(|d| {
            d.markers = if outcome.markers.is_empty() {
                candidates.clone()
            } else {
                outcome.markers.clone()
            };
            d.calibration_model = Some(outcome.frame.model);
        });
        outcome.frame
    }

    /// Segment, extract, refine and validate. Errors carry the raw vertex
    /// count reached before failing.
    fn run_strategy(
        &self,
        strategy: &dyn Strategy,
        ctx: &StageContext<'_>,
        sink: &mut DiagnosticsSink,
    ) -> Result<(Vec<Point2<f64>>, usize, bool), (StrategyError, usize)> {
        ctx.deadline.check().map_err(|e| (StrategyError::from(e), 0))?;
        let mask = strategy.segment(ctx).map_err(|e| (e, 0))?;
        log::debug!(
            "strategy {}: {} foreground px",
            strategy.name(),
            mask.count()
        );
        if sink.is_enabled() {
            sink.with(|d| {
                d.masks.push(StageMask {
                    stage: strategy.name().to_string(),
                    mask: mask.clone(),
                })
            });
        }

        let boundary = strategy.extract_boundary(&mask, ctx).map_err(|e| (e, 0))?;
        let raw = boundary.len();
        ctx.deadline.check().map_err(|e| (StrategyError::from(e), raw))?;

        let refined = refine_boundary(&boundary, ctx.config);
        if refined.hull_substituted {
            sink.event(format!(
                "strategy {}: self-intersecting outline replaced by its hull",
                strategy.name()
            ));
        }
        validate(&refined.ring, ctx.config.min_contour_area).map_err(|e| (StrategyError::from(e), raw))?;
        Ok((refined.ring, raw, refined.hull_substituted))
    }

    #[allow(clippy::too_many_arguments)]
    fn fallback(
        &self,
        seed: Point2<f64>,
        width: usize,
        height: usize,
        frame: outline_calib::CalibrationFrame,
        reason: FallbackReason,
        mut sink: DiagnosticsSink,
        started: Instant,
    ) -> DetectionResult {
        log::warn!("returning fallback shape ({reason:?})");
        sink.with(|d| d.elapsed_ms = started.elapsed().as_secs_f64() * 1e3);
        DetectionResult::Fallback {
            outline: CalibratedOutline::new(fallback_shape(seed, width, height), &frame),
            frame,
            reason,
            diagnostics: sink.finish(),
        }
    }
}

/// Factor applied to the image so its longer side fits `max_dimension`;
/// 1 when it already fits.
pub fn processing_scale(width: usize, height: usize, max_dimension: usize) -> f64 {
    let longest = width.max(height);
    if max_dimension == 0 || longest <= max_dimension {
        1.0
    } else {
        max_dimension as f64 / longest as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outline_core::InputError;

    #[test]
    fn scale_only_shrinks_oversized_images() {
        assert_eq!(processing_scale(800, 600, 1200), 1.0);
        assert_eq!(processing_scale(2400, 1200, 1200), 0.5);
        assert_eq!(processing_scale(4000, 4000, 0), 1.0);
    }

    #[test]
    fn malformed_view_is_the_only_error() {
        let data = vec![0u8; 10];
        let bad = RgbImageView {
            width: 4,
            height: 4,
            data: &data,
        };
        let detector = Detector::new(DetectorConfig::default());
        let err = detector
            .detect(&bad, &DetectionRequest::new(RealDistances::new(1.0, 1.0)))
            .unwrap_err();
        assert_eq!(
            err,
            DetectError::Input(InputError::BufferLength {
                expected: 48,
                got: 10
            })
        );
    }

    #[test]
    fn zero_size_image_is_rejected() {
        let empty = RgbImageView {
            width: 0,
            height: 4,
            data: &[],
        };
        let detector = Detector::new(DetectorConfig::default());
        let err = detector
            .detect(&empty, &DetectionRequest::new(RealDistances::new(1.0, 1.0)))
            .unwrap_err();
        assert_eq!(
            err,
            DetectError::Input(InputError::ZeroDimensions {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn custom_strategies_run_after_the_builtin_ones() {
        struct Nothing;
        impl Strategy for Nothing {
            fn name(&self) -> &str {
                "nothing"
            }
            fn segment(&self, ctx: &StageContext<'_>) -> Result<outline_core::BinaryMask, StrategyError> {
                Ok(outline_core::BinaryMask::new(ctx.gray.width, ctx.gray.height))
            }
            fn extract_boundary(
                &self,
                _mask: &outline_core::BinaryMask,
                _ctx: &StageContext<'_>,
            ) -> Result<Vec<Point2<f64>>, StrategyError> {
                Err(StrategyError::NoRegion { min: 0, max: 0 })
            }
        }

        let detector = Detector::new(DetectorConfig::default()).with_strategy(Nothing);
        assert_eq!(
            detector.strategy_names(),
            vec!["seeded_trace", "threshold_sweep", "otsu_hull", "nothing"]
        );
    }
}
