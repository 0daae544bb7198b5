//! Broker mailbox and setter wire messages

use tokio::sync::oneshot;

use crate::channel::{Receiver, Sender};
use crate::geometry::GeometryUpdate;
use crate::plane::OverlayPlaneId;

use super::stats::BrokerStats;

/// Message sent by the active setter (compositor side)
#[derive(Debug, Clone, PartialEq)]
pub enum SetterMessage {
    /// Place plane `plane_id` at `update`
    SetGeometry {
        plane_id: OverlayPlaneId,
        update: GeometryUpdate,
    },
}

/// Work item processed by the broker task, in arrival order
#[derive(Debug)]
pub(crate) enum BrokerCommand {
    /// Insert or replace the subscriber for a plane
    RegisterSubscriber {
        plane_id: OverlayPlaneId,
        client: Sender<GeometryUpdate>,
        ack: oneshot::Sender<()>,
    },
    /// A subscriber channel closed
    SubscriberGone {
        plane_id: OverlayPlaneId,
        connection: u64,
    },
    /// Bind a new setter endpoint, revoking any current one
    BindSetter { endpoint: Receiver<SetterMessage> },
    /// Message forwarded from the setter bound under `generation`
    FromSetter {
        generation: u64,
        message: SetterMessage,
    },
    /// The setter bound under `generation` hung up
    SetterGone { generation: u64 },
    /// Snapshot counters
    Stats { reply: oneshot::Sender<BrokerStats> },
}
