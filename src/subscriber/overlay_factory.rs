//! Hole frame factory

use crate::geometry::Size;
use crate::plane::OverlayPlaneId;

use super::frame::VideoFrame;

/// Size used in place of an empty presentation size
pub const FALLBACK_FRAME_SIZE: Size = Size::new(1, 1);

/// Produces hole frames for one video element
///
/// The factory mints the element's [`OverlayPlaneId`] when it is built; the
/// id never changes for the factory's lifetime.
#[derive(Debug, Clone)]
pub struct VideoOverlayFactory {
    plane_id: OverlayPlaneId,
}

impl VideoOverlayFactory {
    /// Create a factory with a freshly minted plane id
    pub fn new() -> Self {
        Self {
            plane_id: OverlayPlaneId::new(),
        }
    }

    pub fn plane_id(&self) -> OverlayPlaneId {
        self.plane_id
    }

    /// Hole frame of the given size
    ///
    /// An empty size yields a 1x1 black frame instead; an empty render target
    /// trips downstream size checks.
    pub fn create_frame(&self, size: Size) -> VideoFrame {
        if size.is_empty() {
            tracing::debug!(plane = %self.plane_id, size = %size, "Empty hole size, using black frame");
            return VideoFrame::Black {
                size: FALLBACK_FRAME_SIZE,
            };
        }

        VideoFrame::Hole {
            plane_id: self.plane_id,
            size,
        }
    }
}

impl Default for VideoOverlayFactory {
    fn default() -> Self {
        Self::new()
    }
}
