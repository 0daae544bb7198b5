//! Underlay overlay strategy
//!
//! Runs once per compositor frame over the root render pass:
//!
//! 1. **Propose**: find the topmost visible, eligible hole quad.
//! 2. **Attempt**: walk the quads front-to-back, accumulate the content
//!    rect around the winning hole, and build the output quad list with the
//!    hole replaced by a placeholder. This step is a pure function of the
//!    input pass plus the strategy's Inactive/Active state.
//! 3. **Commit**: send the winner's geometry through the setter.
//!
//! Only one underlay is promoted per frame. Any other hole quads in the same
//! frame are left untouched in the output (`UnderlayFrame::geometry` is a
//! single slot; a list there is where multi-overlay support would go).

use crate::geometry::{GeometryUpdate, Rect};
use crate::plane::OverlayPlaneId;

use super::candidate::{CandidateFactory, OverlayCandidate};
use super::config::StrategyConfig;
use super::link::SetterLink;
use super::quad::{BlendMode, Color, DrawQuad, OutputSurfacePlane, RenderPass};

/// Whether an underlay was promoted on the last attempted frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnderlayState {
    #[default]
    Inactive,
    Active,
}

/// Hole quad chosen during the propose phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProposedCandidate {
    /// Index of the quad in the render pass
    pub index: usize,
    pub plane_id: OverlayPlaneId,
    pub candidate: OverlayCandidate,
}

/// Geometry to emit for one plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneGeometry {
    pub plane_id: OverlayPlaneId,
    pub update: GeometryUpdate,
}

/// Output of one attempted frame
#[derive(Debug, Clone, PartialEq)]
pub struct UnderlayFrame {
    /// The pass's quads with the winning hole replaced
    pub quads: Vec<DrawQuad>,
    /// Geometry to commit, if an underlay was promoted
    pub geometry: Option<PlaneGeometry>,
    /// Opaque content bounds around the underlay, for damage tracking
    pub content_bounds: Option<Rect>,
}

impl UnderlayFrame {
    /// True if an underlay was promoted on this frame
    pub fn has_underlay(&self) -> bool {
        self.geometry.is_some()
    }
}

/// Compositor-side underlay strategy
#[derive(Debug)]
pub struct UnderlayStrategy {
    config: StrategyConfig,
    setter: SetterLink,
    state: UnderlayState,
}

impl UnderlayStrategy {
    /// Create a strategy that commits through `setter`
    pub fn new(config: StrategyConfig, setter: SetterLink) -> Self {
        Self {
            config,
            setter,
            state: UnderlayState::Inactive,
        }
    }

    pub fn state(&self) -> UnderlayState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == UnderlayState::Active
    }

    /// Pick the topmost eligible hole quad
    ///
    /// Later quads in draw order win over earlier ones.
    pub fn propose(
        &self,
        pass: &RenderPass,
        factory: &impl CandidateFactory,
    ) -> Option<ProposedCandidate> {
        pass.quads
            .iter()
            .enumerate()
            .filter(|(_, quad)| !quad.is_invisible())
            .filter_map(|(index, quad)| {
                eligible(quad, factory).map(|(plane_id, candidate)| ProposedCandidate {
                    index,
                    plane_id,
                    candidate,
                })
            })
            .last()
    }

    /// Build the output frame and update the Inactive/Active state
    pub fn attempt(&mut self, pass: &RenderPass, factory: &impl CandidateFactory) -> UnderlayFrame {
        let frame = plan_underlay(&pass.quads, factory, self.config.background_color);

        let next = if frame.has_underlay() {
            UnderlayState::Active
        } else {
            UnderlayState::Inactive
        };
        if next != self.state {
            tracing::info!(
                from = ?self.state,
                to = ?next,
                plane = ?frame.geometry.map(|g| g.plane_id.to_string()),
                "Underlay state changed"
            );
            self.state = next;
        }

        frame
    }

    /// Send the frame's geometry to the broker
    ///
    /// # Panics
    ///
    /// Panics if the frame promoted an underlay but no setter was ever
    /// connected to this strategy's link; the pipeline was not wired up.
    pub fn commit(&self, frame: &UnderlayFrame) {
        let Some(geometry) = frame.geometry else {
            return;
        };

        let Some(setter) = self.setter.get() else {
            panic!("underlay committed with no geometry setter connected");
        };

        if let Err(e) = setter.set_geometry(geometry.plane_id, geometry.update) {
            // Another compositor took over the setter slot
            tracing::warn!(
                plane = %geometry.plane_id,
                error = %e,
                "Geometry setter revoked, update not sent"
            );
        }
    }

    /// Attempt and commit in one step
    pub fn process(&mut self, pass: &RenderPass, factory: &impl CandidateFactory) -> UnderlayFrame {
        let frame = self.attempt(pass, factory);
        self.commit(&frame);
        frame
    }

    /// Let the punched hole show through the primary plane
    pub fn adjust_output_surface_plane(&self, plane: Option<&mut OutputSurfacePlane>) {
        if let Some(plane) = plane {
            if self.is_active() {
                plane.enable_blending = true;
            }
        }
    }
}

/// Plane id and candidate for an eligible hole quad
fn eligible(
    quad: &DrawQuad,
    factory: &impl CandidateFactory,
) -> Option<(OverlayPlaneId, OverlayCandidate)> {
    let plane_id = quad.plane_id()?;
    factory.from_quad(quad).map(|candidate| (plane_id, candidate))
}

/// Front-to-back pass producing the output quads, geometry and content rect
fn plan_underlay(
    quads: &[DrawQuad],
    factory: &impl CandidateFactory,
    background: Color,
) -> UnderlayFrame {
    let mut content_rect = Rect::default();
    let mut winner: Option<(usize, OverlayPlaneId, OverlayCandidate)> = None;

    for (index, quad) in quads.iter().enumerate().rev() {
        if quad.is_invisible() {
            continue;
        }

        let quad_rect = quad.target_rect();
        let mut is_underlay = false;
        if winner.is_none() {
            if let Some((plane_id, candidate)) = eligible(quad, factory) {
                winner = Some((index, plane_id, candidate));
                is_underlay = true;
            }
        }

        // Background-colored fills above the underlay do not hide it
        if winner.is_none() && quad.is_solid_color(background) {
            continue;
        }

        if is_underlay {
            content_rect.subtract(&quad_rect);
        } else {
            content_rect.union(&quad_rect);
        }
    }

    let Some((index, plane_id, candidate)) = winner else {
        return UnderlayFrame {
            quads: quads.to_vec(),
            geometry: None,
            content_bounds: None,
        };
    };

    let mut output = quads.to_vec();
    output[index] = if candidate.has_mask {
        quads[index].placeholder(Color::BLACK, BlendMode::DstOut)
    } else {
        quads[index].placeholder(Color::TRANSPARENT, BlendMode::SrcOver)
    };

    UnderlayFrame {
        quads: output,
        geometry: Some(PlaneGeometry {
            plane_id,
            update: GeometryUpdate::new(candidate.display_rect, candidate.transform),
        }),
        content_bounds: Some(content_rect),
    }
}
