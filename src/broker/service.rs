//! Geometry broker implementation
//!
//! The broker is an actor: [`GeometryBroker`] is a cheap, cloneable handle
//! that only posts commands, and a single spawned task owns the registry and
//! processes commands one at a time. That task is the broker's home sequence;
//! since nothing else touches the registry, it needs no lock, and every
//! register/unregister/update is linearized in mailbox order.
//!
//! Helper tasks (one disconnect watcher per subscriber, one pump per bound
//! setter) hold only a weak reference to the mailbox, so they never keep a
//! stopped broker alive and never call into a broker that is gone.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::channel::{self, Receiver, Sender};
use crate::error::{Error, Result};
use crate::geometry::GeometryUpdate;
use crate::plane::OverlayPlaneId;
use crate::task::AbortOnDrop;

use super::message::{BrokerCommand, SetterMessage};
use super::setter::GeometrySetter;
use super::stats::BrokerStats;

/// Handle to the geometry broker
///
/// All methods return immediately; the work happens later on the broker task.
#[derive(Debug, Clone)]
pub struct GeometryBroker {
    mailbox: mpsc::UnboundedSender<BrokerCommand>,
}

impl GeometryBroker {
    /// Spawn the broker task on the current tokio runtime
    ///
    /// The task exits once every handle has been dropped.
    pub fn spawn() -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = BrokerTask::new(rx, tx.downgrade());
        let handle = tokio::spawn(task.run());

        (Self { mailbox: tx }, handle)
    }

    /// Register `client` as the receiver of geometry for `plane_id`
    ///
    /// Silently replaces any existing subscriber for the same plane. The
    /// returned acknowledgement resolves once the broker has applied the
    /// registration; updates sent after that go to `client`.
    pub fn register_subscriber(
        &self,
        plane_id: OverlayPlaneId,
        client: Sender<GeometryUpdate>,
    ) -> Result<SubscribeAck> {
        let (ack, rx) = oneshot::channel();
        self.post(BrokerCommand::RegisterSubscriber {
            plane_id,
            client,
            ack,
        })?;
        Ok(SubscribeAck { rx })
    }

    /// Bind `endpoint` as the active setter, revoking any previous one
    pub fn bind_setter(&self, endpoint: Receiver<SetterMessage>) -> Result<()> {
        self.post(BrokerCommand::BindSetter { endpoint })
    }

    /// Create a setter channel, bind its receiving end, return the sending end
    pub fn connect_setter(&self) -> Result<GeometrySetter> {
        let (tx, rx) = channel::channel();
        self.bind_setter(rx)?;
        Ok(GeometrySetter::new(tx))
    }

    /// Snapshot of the registry and counters
    pub async fn stats(&self) -> Result<BrokerStats> {
        let (reply, rx) = oneshot::channel();
        self.post(BrokerCommand::Stats { reply })?;
        rx.await.map_err(|_| Error::BrokerClosed)
    }

    /// True while the broker task is accepting commands
    pub fn is_running(&self) -> bool {
        !self.mailbox.is_closed()
    }

    fn post(&self, command: BrokerCommand) -> Result<()> {
        self.mailbox.send(command).map_err(|_| Error::BrokerClosed)
    }
}

/// Acknowledgement for a subscriber registration
#[derive(Debug)]
pub struct SubscribeAck {
    rx: oneshot::Receiver<()>,
}

impl SubscribeAck {
    /// Wait until the broker has applied the registration
    pub async fn wait(self) -> Result<()> {
        self.rx.await.map_err(|_| Error::BrokerClosed)
    }
}

/// Registry entry for one plane
#[derive(Debug)]
struct ClientEntry {
    /// Distinguishes this registration from earlier ones for the same plane
    connection: u64,
    client: Sender<GeometryUpdate>,
    _watcher: AbortOnDrop,
}

/// The single active setter
#[derive(Debug)]
struct SetterSlot {
    generation: u64,
    // Aborting the pump drops the endpoint, which closes the setter's channel
    _pump: AbortOnDrop,
}

struct BrokerTask {
    mailbox: mpsc::UnboundedReceiver<BrokerCommand>,
    weak_mailbox: mpsc::WeakUnboundedSender<BrokerCommand>,
    clients: HashMap<OverlayPlaneId, ClientEntry>,
    setter: Option<SetterSlot>,
    next_connection: u64,
    next_generation: u64,
    updates_delivered: u64,
    updates_dropped: u64,
    stale_setter_messages: u64,
}

impl BrokerTask {
    fn new(
        mailbox: mpsc::UnboundedReceiver<BrokerCommand>,
        weak_mailbox: mpsc::WeakUnboundedSender<BrokerCommand>,
    ) -> Self {
        Self {
            mailbox,
            weak_mailbox,
            clients: HashMap::new(),
            setter: None,
            next_connection: 0,
            next_generation: 0,
            updates_delivered: 0,
            updates_dropped: 0,
            stale_setter_messages: 0,
        }
    }

    async fn run(mut self) {
        tracing::debug!("Geometry broker started");

        while let Some(command) = self.mailbox.recv().await {
            self.handle(command);
        }

        tracing::debug!(
            subscribers = self.clients.len(),
            delivered = self.updates_delivered,
            dropped = self.updates_dropped,
            "Geometry broker stopped"
        );
    }

    fn handle(&mut self, command: BrokerCommand) {
        match command {
            BrokerCommand::RegisterSubscriber {
                plane_id,
                client,
                ack,
            } => {
                self.register_subscriber(plane_id, client);
                // The registrant may have stopped waiting; that is fine
                let _ = ack.send(());
            }
            BrokerCommand::SubscriberGone {
                plane_id,
                connection,
            } => self.on_subscriber_gone(plane_id, connection),
            BrokerCommand::BindSetter { endpoint } => self.bind_setter(endpoint),
            BrokerCommand::FromSetter {
                generation,
                message,
            } => self.on_setter_message(generation, message),
            BrokerCommand::SetterGone { generation } => self.on_setter_gone(generation),
            BrokerCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    fn register_subscriber(&mut self, plane_id: OverlayPlaneId, client: Sender<GeometryUpdate>) {
        let connection = self.next_connection;
        self.next_connection += 1;

        let watcher = watch_subscriber(
            self.weak_mailbox.clone(),
            plane_id,
            connection,
            client.clone(),
        );
        let entry = ClientEntry {
            connection,
            client,
            _watcher: AbortOnDrop::new(watcher),
        };

        match self.clients.insert(plane_id, entry) {
            Some(previous) => {
                tracing::info!(
                    plane = %plane_id,
                    connection = connection,
                    replaced = previous.connection,
                    "Subscriber replaced"
                );
            }
            None => {
                tracing::info!(
                    plane = %plane_id,
                    connection = connection,
                    subscribers = self.clients.len(),
                    "Subscriber registered"
                );
            }
        }
    }

    fn on_subscriber_gone(&mut self, plane_id: OverlayPlaneId, connection: u64) {
        match self.clients.get(&plane_id) {
            Some(entry) if entry.connection == connection => {
                self.clients.remove(&plane_id);
                tracing::info!(
                    plane = %plane_id,
                    connection = connection,
                    subscribers = self.clients.len(),
                    "Subscriber disconnected"
                );
            }
            _ => {
                // The plane was re-registered after this connection; keep the new entry
                tracing::debug!(
                    plane = %plane_id,
                    connection = connection,
                    "Ignoring stale subscriber disconnect"
                );
            }
        }
    }

    fn bind_setter(&mut self, endpoint: Receiver<SetterMessage>) {
        let generation = self.next_generation;
        self.next_generation += 1;

        if let Some(previous) = self.setter.take() {
            tracing::warn!(
                revoked = previous.generation,
                generation = generation,
                "Setter already bound, revoking previous setter"
            );
        }

        let pump = pump_setter(self.weak_mailbox.clone(), generation, endpoint);
        self.setter = Some(SetterSlot {
            generation,
            _pump: AbortOnDrop::new(pump),
        });

        tracing::info!(generation = generation, "Setter bound");
    }

    fn on_setter_message(&mut self, generation: u64, message: SetterMessage) {
        if self.current_generation() != Some(generation) {
            self.stale_setter_messages += 1;
            tracing::debug!(
                generation = generation,
                current = ?self.current_generation(),
                "Ignoring message from revoked setter"
            );
            return;
        }

        match message {
            SetterMessage::SetGeometry { plane_id, update } => self.set_geometry(plane_id, update),
        }
    }

    fn on_setter_gone(&mut self, generation: u64) {
        if self.current_generation() == Some(generation) {
            self.setter = None;
            tracing::info!(generation = generation, "Setter disconnected");
        }
    }

    fn set_geometry(&mut self, plane_id: OverlayPlaneId, update: GeometryUpdate) {
        let Some(entry) = self.clients.get(&plane_id) else {
            // Subscriber not connected yet, or already gone
            self.updates_dropped += 1;
            tracing::debug!(plane = %plane_id, "No subscriber for plane, dropping geometry");
            return;
        };

        match entry.client.send(update) {
            Ok(()) => {
                self.updates_delivered += 1;
                tracing::trace!(
                    plane = %plane_id,
                    rect = %update.rect,
                    transform = %update.transform,
                    "Geometry delivered"
                );
            }
            Err(_) => {
                // Closed but the watcher's notification is still queued
                self.updates_dropped += 1;
                tracing::debug!(plane = %plane_id, "Subscriber channel closed, dropping geometry");
            }
        }
    }

    fn current_generation(&self) -> Option<u64> {
        self.setter.as_ref().map(|slot| slot.generation)
    }

    fn stats(&self) -> BrokerStats {
        BrokerStats {
            subscriber_count: self.clients.len(),
            has_setter: self.setter.is_some(),
            setter_generation: self.current_generation(),
            updates_delivered: self.updates_delivered,
            updates_dropped: self.updates_dropped,
            stale_setter_messages: self.stale_setter_messages,
        }
    }
}

/// Report the subscriber's disconnect back to the broker
fn watch_subscriber(
    mailbox: mpsc::WeakUnboundedSender<BrokerCommand>,
    plane_id: OverlayPlaneId,
    connection: u64,
    client: Sender<GeometryUpdate>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        client.disconnected().await;
        if let Some(mailbox) = mailbox.upgrade() {
            let _ = mailbox.send(BrokerCommand::SubscriberGone {
                plane_id,
                connection,
            });
        }
    })
}

/// Forward a setter's messages into the mailbox, tagged with its generation
fn pump_setter(
    mailbox: mpsc::WeakUnboundedSender<BrokerCommand>,
    generation: u64,
    mut endpoint: Receiver<SetterMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = endpoint.recv().await {
            let Some(mailbox) = mailbox.upgrade() else {
                return;
            };
            if mailbox
                .send(BrokerCommand::FromSetter {
                    generation,
                    message,
                })
                .is_err()
            {
                return;
            }
        }

        if let Some(mailbox) = mailbox.upgrade() {
            let _ = mailbox.send(BrokerCommand::SetterGone { generation });
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::channel::channel;
    use crate::geometry::RectF;

    const WAIT: Duration = Duration::from_secs(2);

    fn update(x: f32) -> GeometryUpdate {
        GeometryUpdate::identity(RectF::new(x, 0.0, 100.0, 100.0))
    }

    async fn subscribe(
        broker: &GeometryBroker,
        plane_id: OverlayPlaneId,
    ) -> Receiver<GeometryUpdate> {
        let (tx, rx) = channel();
        broker
            .register_subscriber(plane_id, tx)
            .unwrap()
            .wait()
            .await
            .unwrap();
        rx
    }

    async fn wait_for_stats(
        broker: &GeometryBroker,
        pred: impl Fn(&BrokerStats) -> bool,
    ) -> BrokerStats {
        for _ in 0..200 {
            let stats = broker.stats().await.unwrap();
            if pred(&stats) {
                return stats;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("broker never reached the expected state");
    }

    #[tokio::test]
    async fn test_register_and_deliver() {
        let (broker, _task) = GeometryBroker::spawn();
        let plane_id = OverlayPlaneId::new();
        let mut rx = subscribe(&broker, plane_id).await;
        let setter = broker.connect_setter().unwrap();

        setter.set_geometry(plane_id, update(1.0)).unwrap();

        let received = timeout(WAIT, rx.recv()).await.unwrap();
        assert_eq!(received, Some(update(1.0)));

        let stats = broker.stats().await.unwrap();
        assert_eq!(stats.subscriber_count, 1);
        assert_eq!(stats.updates_delivered, 1);
        assert_eq!(stats.updates_dropped, 0);
    }

    #[tokio::test]
    async fn test_reregister_replaces_previous_subscriber() {
        let (broker, _task) = GeometryBroker::spawn();
        let plane_id = OverlayPlaneId::new();
        let mut first = subscribe(&broker, plane_id).await;
        let mut second = subscribe(&broker, plane_id).await;
        let setter = broker.connect_setter().unwrap();

        setter.set_geometry(plane_id, update(2.0)).unwrap();

        assert_eq!(timeout(WAIT, second.recv()).await.unwrap(), Some(update(2.0)));
        // The replaced subscriber sees its channel close without ever getting the update
        assert_eq!(timeout(WAIT, first.recv()).await.unwrap(), None);
        assert_eq!(broker.stats().await.unwrap().subscriber_count, 1);
    }

    #[tokio::test]
    async fn test_unknown_plane_is_dropped() {
        let (broker, _task) = GeometryBroker::spawn();
        let known = OverlayPlaneId::new();
        let mut rx = subscribe(&broker, known).await;
        let setter = broker.connect_setter().unwrap();

        setter.set_geometry(OverlayPlaneId::new(), update(3.0)).unwrap();
        setter.set_geometry(known, update(4.0)).unwrap();

        // Same setter, so the unknown update was processed before this one
        assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(update(4.0)));

        let stats = broker.stats().await.unwrap();
        assert_eq!(stats.updates_dropped, 1);
        assert_eq!(stats.updates_delivered, 1);
        assert!(broker.is_running());
    }

    #[tokio::test]
    async fn test_subscriber_disconnect_removes_entry() {
        let (broker, _task) = GeometryBroker::spawn();
        let rx = subscribe(&broker, OverlayPlaneId::new()).await;

        drop(rx);

        let stats = wait_for_stats(&broker, |s| s.subscriber_count == 0).await;
        assert_eq!(stats.subscriber_count, 0);
    }

    #[tokio::test]
    async fn test_stale_disconnect_keeps_new_entry() {
        let (broker, _task) = GeometryBroker::spawn();
        let plane_id = OverlayPlaneId::new();
        let _first = subscribe(&broker, plane_id).await;
        let mut second = subscribe(&broker, plane_id).await;

        // Late disconnect notification for the first registration (connection 0)
        broker
            .post(BrokerCommand::SubscriberGone {
                plane_id,
                connection: 0,
            })
            .unwrap();

        assert_eq!(broker.stats().await.unwrap().subscriber_count, 1);

        let setter = broker.connect_setter().unwrap();
        setter.set_geometry(plane_id, update(5.0)).unwrap();
        assert_eq!(timeout(WAIT, second.recv()).await.unwrap(), Some(update(5.0)));
    }

    #[tokio::test]
    async fn test_bind_setter_revokes_previous() {
        let (broker, _task) = GeometryBroker::spawn();
        let plane_id = OverlayPlaneId::new();
        let mut rx = subscribe(&broker, plane_id).await;

        let first = broker.connect_setter().unwrap();
        let second = broker.connect_setter().unwrap();

        timeout(WAIT, first.revoked()).await.unwrap();
        assert!(!first.is_connected());
        assert!(first.set_geometry(plane_id, update(6.0)).is_err());
        assert!(second.is_connected());

        second.set_geometry(plane_id, update(7.0)).unwrap();
        assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(update(7.0)));

        let stats = broker.stats().await.unwrap();
        assert_eq!(stats.setter_generation, Some(1));
    }

    #[tokio::test]
    async fn test_messages_from_revoked_generation_ignored() {
        let (broker, _task) = GeometryBroker::spawn();
        let plane_id = OverlayPlaneId::new();
        let mut rx = subscribe(&broker, plane_id).await;
        let _first = broker.connect_setter().unwrap();
        let second = broker.connect_setter().unwrap();

        // Forwarded by the first pump just before it was aborted
        broker
            .post(BrokerCommand::FromSetter {
                generation: 0,
                message: SetterMessage::SetGeometry {
                    plane_id,
                    update: update(8.0),
                },
            })
            .unwrap();
        second.set_geometry(plane_id, update(9.0)).unwrap();

        assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(update(9.0)));
        assert_eq!(broker.stats().await.unwrap().stale_setter_messages, 1);
    }

    #[tokio::test]
    async fn test_setter_drop_clears_slot() {
        let (broker, _task) = GeometryBroker::spawn();
        let setter = broker.connect_setter().unwrap();
        wait_for_stats(&broker, |s| s.has_setter).await;

        drop(setter);

        let stats = wait_for_stats(&broker, |s| !s.has_setter).await;
        assert!(stats.setter_generation.is_none());
    }

    #[tokio::test]
    async fn test_broker_stops_when_handles_dropped() {
        let (broker, task) = GeometryBroker::spawn();
        let _rx = subscribe(&broker, OverlayPlaneId::new()).await;

        drop(broker);

        timeout(WAIT, task).await.unwrap().unwrap();
    }
}
