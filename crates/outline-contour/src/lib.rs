//! Region and boundary extraction from binary masks, plus the polygon
//! post-processing that turns a raw pixel boundary into a clean outline.
//!
//! Extraction:
//! - [`connected_components`] labels 4-connected regions with a worklist;
//! - [`trace_boundary`] runs a Moore-neighbour trace from a boundary pixel;
//! - [`ray_cast_contour`] estimates a star-shaped boundary around a seed and
//!   tolerates gaps in fragmented masks.
//!
//! Post-processing works on rings (closed polygons given without the
//! repeated first point) unless stated otherwise.
//!
//! ```
//! use nalgebra::Point2;
//! use outline_contour::{connected_components, simplify_closed, trace_boundary, DEFAULT_STEP_BUDGET};
//! use outline_core::{BinaryMask, Deadline};
//!
//! let mask = BinaryMask::from_fn(40, 40, |x, y| (10..30).contains(&x) && (10..30).contains(&y));
//! let comps = connected_components(&mask, 10, usize::MAX, &Deadline::unbounded())?;
//! let boundary = trace_boundary(&mask, comps[0].start, DEFAULT_STEP_BUDGET).unwrap();
//! let corners = simplify_closed(&boundary, 1.0);
//! assert_eq!(corners.len(), 4);
//! assert!(corners.contains(&Point2::new(29.0, 29.0)));
//! # Ok::<(), outline_core::Expired>(())
//! ```

mod components;
mod hull;
mod intersect;
mod prune;
mod raycast;
mod resample;
mod simplify;
mod smooth;
mod trace;

pub use components::{component_near, connected_components, largest_component, Component, PixelBox};
pub use hull::convex_hull;
pub use intersect::{ensure_simple, is_self_intersecting, segments_intersect};
pub use prune::prune_deep_concavities;
pub use raycast::{adjust_seed, ray_cast_contour, reject_outliers, RayCastError, RayCastParams};
pub use resample::{densify, resample};
pub use simplify::{perpendicular_distance, simplify, simplify_closed, MAX_SIMPLIFY_DEPTH};
pub use smooth::smooth;
pub use trace::{trace_boundary, TraceError, DEFAULT_STEP_BUDGET};

pub use outline_core::{perimeter, polygon_area};
