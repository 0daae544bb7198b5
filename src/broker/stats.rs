//! Broker statistics

/// Point-in-time view of the broker's registry and counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrokerStats {
    /// Number of planes with a live subscriber
    pub subscriber_count: usize,
    /// Whether a setter is currently bound
    pub has_setter: bool,
    /// Generation of the bound setter, if any
    pub setter_generation: Option<u64>,
    /// Updates handed to a subscriber channel
    pub updates_delivered: u64,
    /// Updates dropped because no live subscriber matched
    pub updates_dropped: u64,
    /// Messages ignored because their setter had been revoked
    pub stale_setter_messages: u64,
}

impl BrokerStats {
    /// Total updates the broker has routed or dropped
    pub fn updates_seen(&self) -> u64 {
        self.updates_delivered + self.updates_dropped
    }
}
