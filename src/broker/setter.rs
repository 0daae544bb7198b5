//! Setter role handle

use crate::channel::Sender;
use crate::error::Result;
use crate::geometry::GeometryUpdate;
use crate::plane::OverlayPlaneId;

use super::message::SetterMessage;

/// Compositor-side connection to the broker's setter slot
///
/// Only the most recently bound setter is honored. Once another setter is
/// bound, this handle's channel is torn down and [`is_connected`] turns
/// false; sends after that point fail with `Error::ChannelClosed`.
///
/// [`is_connected`]: GeometrySetter::is_connected
#[derive(Debug, Clone)]
pub struct GeometrySetter {
    tx: Sender<SetterMessage>,
}

impl GeometrySetter {
    pub(crate) fn new(tx: Sender<SetterMessage>) -> Self {
        Self { tx }
    }

    /// Send the geometry for one plane (fire-and-forget)
    pub fn set_geometry(&self, plane_id: OverlayPlaneId, update: GeometryUpdate) -> Result<()> {
        self.tx.send(SetterMessage::SetGeometry { plane_id, update })
    }

    /// True until the broker revokes this setter or shuts down
    pub fn is_connected(&self) -> bool {
        self.tx.is_connected()
    }

    /// Resolves once the broker has revoked this setter or shut down
    pub async fn revoked(&self) {
        self.tx.disconnected().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::channel;
    use crate::geometry::RectF;

    #[tokio::test]
    async fn test_set_geometry_wire_message() {
        let (tx, mut rx) = channel();
        let setter = GeometrySetter::new(tx);
        let plane_id = OverlayPlaneId::new();
        let update = GeometryUpdate::identity(RectF::new(0.0, 0.0, 640.0, 360.0));

        setter.set_geometry(plane_id, update).unwrap();

        assert_eq!(
            rx.recv().await,
            Some(SetterMessage::SetGeometry { plane_id, update })
        );
    }

    #[tokio::test]
    async fn test_revoked_when_endpoint_dropped() {
        let (tx, rx) = channel();
        let setter = GeometrySetter::new(tx);
        assert!(setter.is_connected());

        drop(rx);
        setter.revoked().await;
        assert!(!setter.is_connected());
        assert!(setter
            .set_geometry(OverlayPlaneId::new(), GeometryUpdate::default())
            .is_err());
    }
}
