//! Video frames handed to the video sink

use std::time::Duration;

use bytes::Bytes;

use crate::geometry::Size;
use crate::plane::OverlayPlaneId;

/// A frame as seen by the page's video sink
#[derive(Debug, Clone, PartialEq)]
pub enum VideoFrame {
    /// Marks where the hardware plane shows through
    ///
    /// The compositor turns this into a hole quad tagged with `plane_id`.
    Hole { plane_id: OverlayPlaneId, size: Size },

    /// Opaque black frame
    Black { size: Size },

    /// Decoded picture fetched from the surface owner (texture-callback mode)
    Decoded {
        size: Size,
        timestamp: Duration,
        data: Bytes,
    },
}

impl VideoFrame {
    /// Presentation size
    pub fn size(&self) -> Size {
        match self {
            VideoFrame::Hole { size, .. }
            | VideoFrame::Black { size }
            | VideoFrame::Decoded { size, .. } => *size,
        }
    }

    /// Plane id of a hole frame
    pub fn plane_id(&self) -> Option<OverlayPlaneId> {
        match self {
            VideoFrame::Hole { plane_id, .. } => Some(*plane_id),
            _ => None,
        }
    }

    pub fn is_hole(&self) -> bool {
        matches!(self, VideoFrame::Hole { .. })
    }
}

/// Where the page's video frames go
///
/// Implemented by the element's compositor frame provider. Calls arrive on
/// the subscriber task (`paint_single_frame`) and on the frame-pull loop
/// (`present`), which may run on different threads.
pub trait VideoSink: Send + Sync {
    /// Show `frame` until told otherwise (hole frames, fallback frames)
    fn paint_single_frame(&self, frame: VideoFrame);

    /// Show the frame picked for the current render tick
    fn present(&self, frame: VideoFrame);
}
