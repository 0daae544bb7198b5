//! Hardware overlay surface ownership
//!
//! Players compete for the one overlay surface through a
//! [`SurfaceConsumer`]. A player that cannot acquire it falls back to
//! texture presentation; that outcome is expected, not an error.

pub mod arbiter;
pub mod holder;

pub use arbiter::{SurfaceArbiter, SurfaceConsumer};
pub use holder::{PlatformSurface, SurfaceHandle, SurfaceHolder};
