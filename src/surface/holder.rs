//! Platform surface and holder contracts

use std::fmt;
use std::sync::Arc;

use crate::geometry::Size;

/// The physical overlay surface exposed by the platform
///
/// Implemented by the windowing layer. Queries are cheap and may be made
/// while the arbiter is locked.
pub trait PlatformSurface: Send + Sync + fmt::Debug {
    /// Current surface dimensions
    fn size(&self) -> Size;

    /// Ask the platform to recreate the surface
    fn reset(&self);
}

/// Shared reference to the platform surface
pub type SurfaceHandle = Arc<dyn PlatformSurface>;

/// A player that can hold the overlay surface
pub trait SurfaceHolder: Send + Sync {
    /// The surface this holder acquired is being destroyed
    ///
    /// Called with the arbiter locked, before the handle is dropped. The
    /// holder must stop presenting and must not call back into the arbiter.
    fn on_surface_destroyed(&self);
}
