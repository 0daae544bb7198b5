//! Compositor-side underlay detection and commit
//!
//! Each frame the compositor hands the root [`RenderPass`] to an
//! [`UnderlayStrategy`]. The strategy finds the topmost eligible hole quad,
//! replaces it with a placeholder that lets the hardware plane show through,
//! and sends the plane's display geometry to the broker through the
//! compositor's [`SetterLink`].
//!
//! ```text
//!   RenderPass ──► propose ──► attempt ──► UnderlayFrame ──► commit
//!   (quads)        (winner)    (pure)      quads'            │
//!                                          geometry ─────────┘──► GeometrySetter
//!                                          content_bounds
//! ```
//!
//! Eligibility (whether the hardware can actually show a given quad as an
//! overlay) is decided outside this module and plugged in as a
//! [`CandidateFactory`].

pub mod candidate;
pub mod config;
pub mod link;
pub mod quad;
pub mod underlay;

pub use candidate::{CandidateFactory, OverlayCandidate, TargetRectCandidates};
pub use config::StrategyConfig;
pub use link::SetterLink;
pub use quad::{
    BlendMode, Color, DrawQuad, Material, OutputSurfacePlane, RenderPass, SharedQuadState,
};
pub use underlay::{
    PlaneGeometry, ProposedCandidate, UnderlayFrame, UnderlayState, UnderlayStrategy,
};
