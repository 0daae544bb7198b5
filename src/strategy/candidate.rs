//! Overlay candidate eligibility
//!
//! Whether a hole quad can actually be promoted is decided by the
//! compositor's overlay capability logic. The strategy only consumes the
//! verdict through [`CandidateFactory`].

use crate::geometry::{OverlayTransform, RectF};

use super::quad::DrawQuad;

/// Result of a successful eligibility check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayCandidate {
    /// Where the overlay must be placed, in display coordinates
    pub display_rect: RectF,
    /// Orientation the hardware plane must apply
    pub transform: OverlayTransform,
    /// Whether the quad is clipped by a mask (rounded corners etc.)
    pub has_mask: bool,
}

/// Eligibility test supplied by the compositor
pub trait CandidateFactory {
    /// Return the overlay placement for `quad`, or `None` if it cannot be promoted
    fn from_quad(&self, quad: &DrawQuad) -> Option<OverlayCandidate>;
}

impl<F> CandidateFactory for F
where
    F: Fn(&DrawQuad) -> Option<OverlayCandidate>,
{
    fn from_quad(&self, quad: &DrawQuad) -> Option<OverlayCandidate> {
        self(quad)
    }
}

/// Accepts every hole quad at its target-space rect
///
/// Suitable when capability has been established upstream and every hole
/// maps 1:1 onto the display.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetRectCandidates;

impl CandidateFactory for TargetRectCandidates {
    fn from_quad(&self, quad: &DrawQuad) -> Option<OverlayCandidate> {
        if !quad.is_video_hole() {
            return None;
        }

        Some(OverlayCandidate {
            display_rect: quad.shared.quad_to_target.map_rect_f(quad.rect.into()),
            transform: OverlayTransform::Identity,
            has_mask: false,
        })
    }
}
