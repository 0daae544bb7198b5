//! Setter connection shared by the compositor's strategies
//!
//! The composition root owns one [`SetterLink`] per compositor and hands
//! clones to every [`UnderlayStrategy`](super::UnderlayStrategy) it builds.
//! The broker connection is attached later, once the compositor thread is
//! up, via [`SetterLink::connect`].

use std::sync::Arc;

use parking_lot::RwLock;

use crate::broker::GeometrySetter;

/// Late-bound, shared slot for the compositor's geometry setter
#[derive(Debug, Clone, Default)]
pub struct SetterLink {
    setter: Arc<RwLock<Option<GeometrySetter>>>,
}

impl SetterLink {
    /// Create an unconnected link
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach (or replace) the setter used by every strategy sharing this link
    pub fn connect(&self, setter: GeometrySetter) {
        let replaced = self.setter.write().replace(setter).is_some();
        tracing::info!(replaced = replaced, "Geometry setter connected");
    }

    /// Current setter, if one was ever connected
    pub fn get(&self) -> Option<GeometrySetter> {
        self.setter.read().clone()
    }

    /// True if a setter is attached, even one the broker has since revoked
    pub fn is_connected(&self) -> bool {
        self.setter.read().is_some()
    }
}
