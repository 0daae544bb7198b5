//! Link between the subscriber and the surface-owning process
//!
//! ```text
//!   OverlaySubscriber                       surface owner
//!   ┌──────────────────┐  RendererMessage  ┌────────────────────┐
//!   │ RendererExtension│ ────────────────► │SurfaceOwnerEndpoint│
//!   │                  │ ◄──────────────── │                    │
//!   └──────────────────┘   ClientMessage   └────────────────────┘
//! ```
//!
//! Both directions are [`crate::channel`] channels. Dropping the endpoint
//! is observed by the subscriber as a lost connection.

use std::time::Duration;

use tokio::sync::oneshot;

use crate::channel::{self, Receiver, Sender};
use crate::error::{PipelineError, Result};
use crate::geometry::{Rect, Size};
use crate::plane::OverlayPlaneId;

use super::frame::VideoFrame;
use super::mode::RenderingMode;

/// Outcome of the surface owner's renderer initialization
pub type PipelineStatus = std::result::Result<(), PipelineError>;

/// Request from the subscriber to the surface owner
#[derive(Debug)]
pub enum RendererMessage {
    /// Initialize the renderer for `plane_id` and report its status
    Initialize {
        plane_id: OverlayPlaneId,
        reply: oneshot::Sender<PipelineStatus>,
    },

    /// Start playback at the given media time
    StartPlayingFrom(Duration),

    /// Move the hardware plane of `plane_id` to `bounds`
    SetVideoBounds { plane_id: OverlayPlaneId, bounds: Rect },

    /// Fetch the latest decoded frame, if any
    GetCurrentVideoFrame {
        reply: oneshot::Sender<Option<VideoFrame>>,
    },
}

/// Notification from the surface owner to the subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// The owner decided how video reaches the screen
    UpdateRenderingMode(RenderingMode),

    /// Paint a hole of the given size
    PaintVideoHoleFrame(Size),

    /// Playback reached the end of the stream
    Ended,

    /// Playback failed
    Error(PipelineError),

    /// The owner cannot play this stream; the element should pick another renderer
    Fallback(PipelineError),
}

/// Subscriber side of the link
#[derive(Debug)]
pub struct RendererExtension {
    pub(crate) to_owner: Sender<RendererMessage>,
    pub(crate) from_owner: Receiver<ClientMessage>,
}

/// Surface-owner side of the link
#[derive(Debug)]
pub struct SurfaceOwnerEndpoint {
    requests: Receiver<RendererMessage>,
    client: Sender<ClientMessage>,
}

/// Create a connected subscriber/surface-owner pair
pub fn connect() -> (RendererExtension, SurfaceOwnerEndpoint) {
    let (to_owner, requests) = channel::channel();
    let (client, from_owner) = channel::channel();

    (
        RendererExtension {
            to_owner,
            from_owner,
        },
        SurfaceOwnerEndpoint { requests, client },
    )
}

impl SurfaceOwnerEndpoint {
    /// Next request from the subscriber; `None` once the subscriber is gone
    pub async fn recv(&mut self) -> Option<RendererMessage> {
        self.requests.recv().await
    }

    /// Take a queued request without waiting
    pub fn try_recv(&mut self) -> Option<RendererMessage> {
        self.requests.try_recv()
    }

    pub fn update_rendering_mode(&self, mode: RenderingMode) -> Result<()> {
        self.client.send(ClientMessage::UpdateRenderingMode(mode))
    }

    pub fn paint_video_hole_frame(&self, size: Size) -> Result<()> {
        self.client.send(ClientMessage::PaintVideoHoleFrame(size))
    }

    pub fn ended(&self) -> Result<()> {
        self.client.send(ClientMessage::Ended)
    }

    pub fn error(&self, error: PipelineError) -> Result<()> {
        self.client.send(ClientMessage::Error(error))
    }

    pub fn fallback(&self, reason: PipelineError) -> Result<()> {
        self.client.send(ClientMessage::Fallback(reason))
    }
}
