//! Renderer-side overlay subscriber
//!
//! Bridges the broker's geometry updates for one video element to the
//! process that owns the hardware surface, and runs the element's
//! punch-out / texture-callback rendering state machine.
//!
//! - [`VideoOverlayFactory`] mints the element's plane id and its hole frames
//! - [`OverlaySubscriber`] is the per-element actor; [`SubscriberHandle`]
//!   drives it from any thread
//! - [`extension`] is the link to the surface owner

pub mod client;
pub mod config;
pub mod extension;
pub mod frame;
pub mod mode;
pub mod overlay_factory;

pub use client::{OverlaySubscriber, SubscriberEvent, SubscriberHandle, SubscriberState};
pub use config::SubscriberConfig;
pub use extension::{
    ClientMessage, PipelineStatus, RendererExtension, RendererMessage, SurfaceOwnerEndpoint,
};
pub use frame::{VideoFrame, VideoSink};
pub use mode::RenderingMode;
pub use overlay_factory::VideoOverlayFactory;
