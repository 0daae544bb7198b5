//! Draw quads and render passes
//!
//! The minimal slice of a compositor frame the underlay strategy needs:
//! an ordered quad list where each quad has bounds, a quad-to-target
//! transform, an opacity and a material. Hole quads carry the
//! [`OverlayPlaneId`] of the video element that produced them.

use crate::geometry::{QuadTransform, Rect};
use crate::plane::OverlayPlaneId;

/// Straight-alpha RGBA color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= f32::EPSILON
    }
}

/// How a quad combines with what is beneath it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// Regular alpha blending
    #[default]
    SrcOver,
    /// Erase the destination where the source is opaque
    DstOut,
}

/// What a quad draws
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Placeholder marking where a video overlay shows through
    VideoHole { plane_id: OverlayPlaneId },
    /// Flat color fill
    SolidColor { color: Color, blend_mode: BlendMode },
    /// Any textured content (UI, images, software-decoded video)
    Texture { resource_id: u32 },
}

/// State shared by the quads of one layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedQuadState {
    /// Maps quad space into the render pass's target space
    pub quad_to_target: QuadTransform,
    /// Layer opacity in `[0, 1]`
    pub opacity: f32,
}

impl Default for SharedQuadState {
    fn default() -> Self {
        Self {
            quad_to_target: QuadTransform::IDENTITY,
            opacity: 1.0,
        }
    }
}

/// One draw primitive in a render pass
#[derive(Debug, Clone, PartialEq)]
pub struct DrawQuad {
    /// Bounds in quad space
    pub rect: Rect,
    /// Part of `rect` that is actually visible
    pub visible_rect: Rect,
    pub needs_blending: bool,
    pub shared: SharedQuadState,
    pub material: Material,
}

impl DrawQuad {
    /// Hole quad for the given plane
    pub fn video_hole(rect: Rect, plane_id: OverlayPlaneId) -> Self {
        Self::with_material(rect, false, Material::VideoHole { plane_id })
    }

    /// Opaque or translucent color fill
    pub fn solid_color(rect: Rect, color: Color) -> Self {
        Self::with_material(
            rect,
            color.a < 1.0,
            Material::SolidColor {
                color,
                blend_mode: BlendMode::SrcOver,
            },
        )
    }

    /// Textured content
    pub fn texture(rect: Rect, resource_id: u32) -> Self {
        Self::with_material(rect, true, Material::Texture { resource_id })
    }

    fn with_material(rect: Rect, needs_blending: bool, material: Material) -> Self {
        Self {
            rect,
            visible_rect: rect,
            needs_blending,
            shared: SharedQuadState::default(),
            material,
        }
    }

    /// Set the visible rect
    pub fn visible(mut self, visible_rect: Rect) -> Self {
        self.visible_rect = visible_rect;
        self
    }

    /// Set the quad-to-target transform
    pub fn transformed(mut self, quad_to_target: QuadTransform) -> Self {
        self.shared.quad_to_target = quad_to_target;
        self
    }

    /// Set the layer opacity
    pub fn opacity(mut self, opacity: f32) -> Self {
        self.shared.opacity = opacity;
        self
    }

    /// Plane id if this is a hole quad
    pub fn plane_id(&self) -> Option<OverlayPlaneId> {
        match self.material {
            Material::VideoHole { plane_id } => Some(plane_id),
            _ => None,
        }
    }

    pub fn is_video_hole(&self) -> bool {
        matches!(self.material, Material::VideoHole { .. })
    }

    /// True for a normally blended solid quad of exactly `color`
    ///
    /// Quads of that color drawn with any other blend mode (such as a
    /// `DstOut` placeholder) still affect the output, so they do not count.
    pub fn is_solid_color(&self, color: Color) -> bool {
        matches!(
            self.material,
            Material::SolidColor { color: c, blend_mode: BlendMode::SrcOver } if c == color
        )
    }

    /// True if drawing the quad cannot change the output
    pub fn is_invisible(&self) -> bool {
        if self.visible_rect.is_empty() || self.shared.opacity < f32::EPSILON {
            return true;
        }
        matches!(
            self.material,
            Material::SolidColor { color, blend_mode: BlendMode::SrcOver } if color.is_transparent()
        )
    }

    /// Bounds in target space
    pub fn target_rect(&self) -> Rect {
        self.shared.quad_to_target.map_rect(self.rect)
    }

    /// Solid-color quad occupying the same place as this one
    pub(crate) fn placeholder(&self, color: Color, blend_mode: BlendMode) -> DrawQuad {
        DrawQuad {
            rect: self.rect,
            visible_rect: self.visible_rect,
            needs_blending: true,
            shared: self.shared,
            material: Material::SolidColor { color, blend_mode },
        }
    }
}

/// Quads of one render pass, in draw order (first drawn first, last on top)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPass {
    pub output_rect: Rect,
    pub quads: Vec<DrawQuad>,
}

impl RenderPass {
    pub fn new(output_rect: Rect) -> Self {
        Self {
            output_rect,
            quads: Vec::new(),
        }
    }

    /// Append a quad on top of the existing ones
    pub fn push(&mut self, quad: DrawQuad) -> &mut Self {
        self.quads.push(quad);
        self
    }
}

/// The primary plane the compositor draws the UI into
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputSurfacePlane {
    pub display_rect: Rect,
    pub enable_blending: bool,
}
