//! Subscriber configuration

use std::time::Duration;

/// Render interval of a 60 Hz display
pub const DEFAULT_RENDER_INTERVAL: Duration = Duration::from_micros(16_666);

/// Shortest frame-pull period accepted
pub const MIN_RENDER_INTERVAL: Duration = Duration::from_millis(1);

/// Overlay subscriber options
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Period of the frame-pull loop in texture-callback mode, at least
    /// [`MIN_RENDER_INTERVAL`]
    pub render_interval: Duration,

    /// Capacity of the event channel handed back by `spawn`; events that
    /// arrive while it is full are logged and dropped
    pub event_capacity: usize,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            render_interval: DEFAULT_RENDER_INTERVAL,
            event_capacity: 256,
        }
    }
}

impl SubscriberConfig {
    /// Set the frame-pull period
    pub fn render_interval(mut self, interval: Duration) -> Self {
        self.render_interval = interval.max(MIN_RENDER_INTERVAL);
        self
    }

    /// Set the event channel capacity
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SubscriberConfig::default();
        assert_eq!(config.render_interval, Duration::from_micros(16_666));
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn test_builder() {
        let config = SubscriberConfig::default()
            .render_interval(Duration::from_millis(5))
            .event_capacity(0);
        assert_eq!(config.render_interval, Duration::from_millis(5));
        // A zero-capacity mpsc channel is invalid
        assert_eq!(config.event_capacity, 1);
    }

    #[test]
    fn test_zero_render_interval_clamped() {
        let config = SubscriberConfig::default().render_interval(Duration::ZERO);
        assert_eq!(config.render_interval, MIN_RENDER_INTERVAL);

        let config = SubscriberConfig::default().render_interval(Duration::from_micros(10));
        assert_eq!(config.render_interval, Duration::from_millis(1));
    }
}
