//! Geometry primitives shared by every role in the pipeline
//!
//! - [`Rect`], [`RectF`] and [`Size`] with the union/subtract semantics used
//!   for content-rect accumulation
//! - [`OverlayTransform`] for hardware plane orientation and
//!   [`QuadTransform`] for mapping quads into target space
//! - [`GeometryUpdate`], the value routed from compositor to subscriber

pub mod rect;
pub mod transform;
pub mod update;

pub use rect::{Rect, RectF, Size};
pub use transform::{OverlayTransform, QuadTransform};
pub use update::GeometryUpdate;
