//! Overlay plane identity
//!
//! Every video element mints exactly one [`OverlayPlaneId`] when its overlay
//! factory is built. The id tags the hole quads it produces, keys its broker
//! subscription, and names the plane when bounds reach the surface owner.

use std::fmt;

use uuid::Uuid;

/// Opaque, unguessable 128-bit routing key for one video element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayPlaneId(Uuid);

impl OverlayPlaneId {
    /// Mint a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Rebuild an id received from a peer process
    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Raw value for transport across a process boundary
    pub fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }
}

impl Default for OverlayPlaneId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OverlayPlaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Simple (hyphenless) form keeps log lines short
        write!(f, "{}", self.0.simple())
    }
}
