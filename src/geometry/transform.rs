//! Overlay and quad transforms

use std::fmt;

use super::rect::{Rect, RectF};

/// Orientation applied by the hardware plane when presenting the overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OverlayTransform {
    /// No transform
    #[default]
    Identity,
    /// Mirror along the vertical axis
    FlipHorizontal,
    /// Mirror along the horizontal axis
    FlipVertical,
    /// Clockwise rotation by 90 degrees
    Rotate90,
    /// Rotation by 180 degrees
    Rotate180,
    /// Clockwise rotation by 270 degrees
    Rotate270,
}

impl OverlayTransform {
    /// True if the transform swaps width and height
    pub fn swaps_axes(&self) -> bool {
        matches!(self, OverlayTransform::Rotate90 | OverlayTransform::Rotate270)
    }
}

impl fmt::Display for OverlayTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverlayTransform::Identity => "identity",
            OverlayTransform::FlipHorizontal => "flip-horizontal",
            OverlayTransform::FlipVertical => "flip-vertical",
            OverlayTransform::Rotate90 => "rotate-90",
            OverlayTransform::Rotate180 => "rotate-180",
            OverlayTransform::Rotate270 => "rotate-270",
        };
        f.write_str(name)
    }
}

/// Axis-aligned quad-to-target transform (scale, then translate)
///
/// Render passes handed to the underlay strategy are already flattened, so
/// quads only ever need to be scaled and moved into target space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadTransform {
    pub scale_x: f32,
    pub scale_y: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl QuadTransform {
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    /// Pure translation
    pub const fn translate(x: f32, y: f32) -> Self {
        Self {
            translate_x: x,
            translate_y: y,
            ..Self::IDENTITY
        }
    }

    /// Pure scale
    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self {
            scale_x: sx,
            scale_y: sy,
            ..Self::IDENTITY
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Map a rect into target space
    pub fn map_rect_f(&self, rect: RectF) -> RectF {
        let x0 = rect.x * self.scale_x + self.translate_x;
        let x1 = rect.right() * self.scale_x + self.translate_x;
        let y0 = rect.y * self.scale_y + self.translate_y;
        let y1 = rect.bottom() * self.scale_y + self.translate_y;

        // Negative scales mirror, so normalize the edges
        RectF::from_ltrb(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Map an integer rect into target space, rounding outward
    pub fn map_rect(&self, rect: Rect) -> Rect {
        if self.is_identity() {
            return rect;
        }
        self.map_rect_f(RectF::from(rect)).to_enclosing_rect()
    }
}

impl Default for QuadTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
