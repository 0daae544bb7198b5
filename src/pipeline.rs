//! Composition root
//!
//! [`OverlayPipeline`] owns the pieces a coordinator process wires together:
//! the geometry broker, the compositor's setter link and the surface
//! arbiter. Strategies and subscribers are created through it so they share
//! the same broker and setter without any global state.
//!
//! ```text
//!   OverlayPipeline
//!     ├── GeometryBroker ◄──── connect_compositor() binds a setter
//!     ├── SetterLink ───────── cloned into every UnderlayStrategy
//!     └── SurfaceArbiter ───── handed to the surface-owning side
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::broker::{BrokerStats, GeometryBroker};
use crate::error::Result;
use crate::strategy::{SetterLink, StrategyConfig, UnderlayStrategy};
use crate::subscriber::{
    OverlaySubscriber, RendererExtension, SubscriberConfig, SubscriberEvent, SubscriberHandle,
    VideoOverlayFactory, VideoSink,
};
use crate::surface::SurfaceArbiter;

/// Configuration for every role in the pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub subscriber: SubscriberConfig,
    pub strategy: StrategyConfig,
}

impl PipelineConfig {
    /// Set the subscriber options
    pub fn subscriber(mut self, config: SubscriberConfig) -> Self {
        self.subscriber = config;
        self
    }

    /// Set the underlay strategy options
    pub fn strategy(mut self, config: StrategyConfig) -> Self {
        self.strategy = config;
        self
    }
}

/// Running overlay pipeline
pub struct OverlayPipeline {
    config: PipelineConfig,
    broker: GeometryBroker,
    broker_task: JoinHandle<()>,
    setter: SetterLink,
    arbiter: Arc<SurfaceArbiter>,
}

impl OverlayPipeline {
    /// Start the broker on the current tokio runtime
    pub fn start(config: PipelineConfig) -> Self {
        let (broker, broker_task) = GeometryBroker::spawn();
        tracing::info!("Overlay pipeline started");

        Self {
            config,
            broker,
            broker_task,
            setter: SetterLink::new(),
            arbiter: SurfaceArbiter::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn broker(&self) -> &GeometryBroker {
        &self.broker
    }

    /// The compositor's setter slot, shared by its strategies
    pub fn setter_link(&self) -> &SetterLink {
        &self.setter
    }

    pub fn arbiter(&self) -> &Arc<SurfaceArbiter> {
        &self.arbiter
    }

    /// Bind a fresh setter for the compositor
    ///
    /// Call again when the compositor restarts; the previous setter is
    /// revoked by the broker.
    pub fn connect_compositor(&self) -> Result<()> {
        let setter = self.broker.connect_setter()?;
        self.setter.connect(setter);
        Ok(())
    }

    /// Strategy for one of the compositor's outputs
    ///
    /// May be created before the compositor is connected; it commits through
    /// whichever setter is current at commit time.
    pub fn underlay_strategy(&self) -> UnderlayStrategy {
        UnderlayStrategy::new(self.config.strategy.clone(), self.setter.clone())
    }

    /// Spawn the subscriber for a new video element
    pub fn spawn_subscriber(
        &self,
        extension: RendererExtension,
        sink: Arc<dyn VideoSink>,
    ) -> (
        SubscriberHandle,
        mpsc::Receiver<SubscriberEvent>,
        JoinHandle<()>,
    ) {
        OverlaySubscriber::spawn(
            self.config.subscriber.clone(),
            VideoOverlayFactory::new(),
            self.broker.clone(),
            extension,
            sink,
        )
    }

    /// Broker diagnostics
    pub async fn stats(&self) -> Result<BrokerStats> {
        self.broker.stats().await
    }

    /// Stop the broker
    ///
    /// Outstanding setters and subscribers observe their channels closing.
    /// The revoked setter stays in the link, so strategies that commit
    /// afterwards log the failed send instead of panicking.
    pub fn shutdown(self) {
        self.broker_task.abort();
        tracing::info!("Overlay pipeline stopped");
    }
}
