//! Message channel between roles
//!
//! Every cross-role link (setter to broker, broker to subscriber, subscriber
//! to surface owner) is an ordered, reliable, unbounded channel. Sends never
//! block and are never acknowledged. Dropping either end is the only
//! cancellation signal: the other side observes it as a disconnect.
//!
//! The in-process implementation sits on `tokio::sync::mpsc`; a transport
//! that crosses a real process boundary only has to preserve the same
//! ordering and disconnect semantics.

use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Create a connected channel pair
pub fn channel<M>() -> (Sender<M>, Receiver<M>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Sender { tx }, Receiver { rx })
}

/// Sending end of a channel
#[derive(Debug)]
pub struct Sender<M> {
    tx: mpsc::UnboundedSender<M>,
}

impl<M> Sender<M> {
    /// Send a message without waiting
    ///
    /// Fails only when the receiving end has been dropped.
    pub fn send(&self, msg: M) -> Result<()> {
        self.tx.send(msg).map_err(|_| Error::ChannelClosed)
    }

    /// True while the receiving end is alive
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Resolves once the receiving end has been dropped or closed
    pub async fn disconnected(&self) {
        self.tx.closed().await;
    }

    /// True if both senders feed the same receiver
    pub fn same_channel(&self, other: &Sender<M>) -> bool {
        self.tx.same_channel(&other.tx)
    }
}

impl<M> Clone for Sender<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

/// Receiving end of a channel
#[derive(Debug)]
pub struct Receiver<M> {
    rx: mpsc::UnboundedReceiver<M>,
}

impl<M> Receiver<M> {
    /// Wait for the next message; `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<M> {
        self.rx.recv().await
    }

    /// Take a queued message without waiting
    pub fn try_recv(&mut self) -> Option<M> {
        self.rx.try_recv().ok()
    }

    /// Refuse further messages; senders observe a disconnect
    pub fn close(&mut self) {
        self.rx.close();
    }
}
