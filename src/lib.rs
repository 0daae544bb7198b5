//! Geometry synchronization for punch-out video overlays
//!
//! A video element that plays through the platform's hardware overlay only
//! paints a transparent hole into the page. Something has to tell the
//! surface-owning process where that hole ends up on screen, every frame,
//! across three processes. This crate implements that path and the
//! ownership rules for the single hardware surface.
//!
//! # Architecture
//!
//! ```text
//!   compositor           coordinator          renderer              surface owner
//!   UnderlayStrategy     GeometryBroker       OverlaySubscriber     decoder / player
//!   ────────────────     ──────────────       ─────────────────     ────────────────
//!   hole quad ──setter──► plane id ──client──► enclosing rect ─────► set video bounds
//!   placeholder quad      lookup               hole frames           SurfaceArbiter
//! ```
//!
//! - [`broker`]: N:M routing keyed by [`OverlayPlaneId`], single active setter
//! - [`strategy`]: per-frame underlay detection, placeholder, commit
//! - [`subscriber`]: per-element forwarder and rendering-mode state machine
//! - [`surface`]: exclusive ownership of the hardware overlay surface
//! - [`pipeline`]: composition root wiring the roles together
//!
//! # Example
//!
//! ```no_run
//! use punchout::pipeline::{OverlayPipeline, PipelineConfig};
//! use punchout::strategy::{DrawQuad, RenderPass, TargetRectCandidates};
//! use punchout::geometry::Rect;
//! use punchout::plane::OverlayPlaneId;
//!
//! # async fn example() -> punchout::error::Result<()> {
//! let pipeline = OverlayPipeline::start(PipelineConfig::default());
//! pipeline.connect_compositor()?;
//!
//! let mut strategy = pipeline.underlay_strategy();
//! let mut pass = RenderPass::new(Rect::new(0, 0, 1920, 1080));
//! pass.push(DrawQuad::video_hole(Rect::new(0, 0, 1280, 720), OverlayPlaneId::new()));
//!
//! let frame = strategy.process(&pass, &TargetRectCandidates);
//! assert!(frame.has_underlay());
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod channel;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod plane;
pub mod strategy;
pub mod subscriber;
pub mod surface;

mod task;

pub use broker::{BrokerStats, GeometryBroker, GeometrySetter};
pub use error::{Error, PipelineError, Result, SurfaceError};
pub use geometry::{GeometryUpdate, OverlayTransform, Rect, RectF, Size};
pub use pipeline::{OverlayPipeline, PipelineConfig};
pub use plane::OverlayPlaneId;
pub use strategy::{StrategyConfig, UnderlayStrategy};
pub use subscriber::{OverlaySubscriber, SubscriberConfig, SubscriberHandle, VideoOverlayFactory};
pub use surface::{SurfaceArbiter, SurfaceConsumer};
