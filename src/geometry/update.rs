//! Geometry update value

use super::rect::RectF;
use super::transform::OverlayTransform;

/// Absolute placement of one overlay plane for one committed frame
///
/// Updates are not deltas: each one fully replaces the previous update for
/// the same plane, so dropping or coalescing intermediate updates is safe.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeometryUpdate {
    /// Display rect in target coordinates
    pub rect: RectF,
    /// Orientation of the hardware plane
    pub transform: OverlayTransform,
}

impl GeometryUpdate {
    /// Create a new update
    pub fn new(rect: RectF, transform: OverlayTransform) -> Self {
        Self { rect, transform }
    }

    /// Create an update with the identity transform
    pub fn identity(rect: RectF) -> Self {
        Self::new(rect, OverlayTransform::Identity)
    }
}
