//! Overlay subscriber actor
//!
//! One [`OverlaySubscriber`] runs per video element. It owns the element's
//! plane id, subscribes to the broker for that plane, and forwards every
//! geometry update to the surface owner as integer bounds. It also follows
//! the rendering mode the surface owner picks: in punch-out mode the page
//! only paints a hole, in texture-callback mode a frame-pull loop fetches
//! decoded frames and presents them through the [`VideoSink`].
//!
//! ```text
//!   GeometryBroker ── GeometryUpdate ──┐
//!                                      ▼
//!   SubscriberHandle ─► mailbox ─► OverlaySubscriber ── RendererMessage ──► surface owner
//!   (any thread)                       ▲  │         ◄── ClientMessage ─────
//!                                      │  └─► VideoSink::paint_single_frame
//!                   frame-pull loop ───┘      (hole frames)
//!                   (texture-callback mode, VideoSink::present)
//! ```
//!
//! All state lives on the subscriber task. The only shared state is the
//! cached frame, which render ticks read without waiting for the task.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::broker::GeometryBroker;
use crate::channel::{self, Receiver};
use crate::error::{Error, PipelineError, Result};
use crate::geometry::{GeometryUpdate, Size};
use crate::plane::OverlayPlaneId;
use crate::task::AbortOnDrop;

use super::config::{SubscriberConfig, MIN_RENDER_INTERVAL};
use super::extension::{ClientMessage, PipelineStatus, RendererExtension, RendererMessage};
use super::frame::{VideoFrame, VideoSink};
use super::mode::RenderingMode;
use super::overlay_factory::VideoOverlayFactory;

/// Events from the overlay subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriberEvent {
    /// Initialization finished with the surface owner's status
    Initialized(PipelineStatus),

    /// Playback failed, or the surface owner connection was lost
    Error(PipelineError),

    /// The surface owner cannot play this stream
    Fallback(PipelineError),

    /// Playback reached the end of the stream
    Ended,
}

/// Snapshot of a subscriber's state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberState {
    pub mode: RenderingMode,
    pub playing: bool,
    pub pull_loop_running: bool,
    /// The broker has applied this element's registration
    pub subscribed: bool,
    pub initialized: bool,
}

type FrameCache = Arc<Mutex<Option<VideoFrame>>>;

#[derive(Debug)]
enum SubscriberCommand {
    Initialize { reply: oneshot::Sender<Result<()>> },
    Subscribed,
    HandshakeDone(PipelineStatus),
    StartPlayingFrom(Duration),
    PaintVideoHoleFrame(Size),
    UpdateCurrentFrame,
    FrameFetched(Option<VideoFrame>),
    State { reply: oneshot::Sender<SubscriberState> },
    Shutdown,
}

/// Handle to a running overlay subscriber
///
/// Cloneable and usable from any thread. The subscriber stops when
/// [`shutdown`](Self::shutdown) is called or every handle is dropped.
#[derive(Debug, Clone)]
pub struct SubscriberHandle {
    plane_id: OverlayPlaneId,
    render_interval: Duration,
    mailbox: mpsc::UnboundedSender<SubscriberCommand>,
    cache: FrameCache,
}

impl SubscriberHandle {
    /// Plane id of the element this subscriber serves
    pub fn plane_id(&self) -> OverlayPlaneId {
        self.plane_id
    }

    /// Interval at which render ticks are expected
    pub fn preferred_render_interval(&self) -> Duration {
        self.render_interval
    }

    /// Subscribe to the broker and start the surface owner handshake
    ///
    /// Returns once both requests are sent. Completion is reported later as
    /// [`SubscriberEvent::Initialized`].
    ///
    /// # Panics
    ///
    /// The subscriber task panics if initialized twice.
    pub async fn initialize(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.post(SubscriberCommand::Initialize { reply })?;
        rx.await.map_err(|_| Error::SubscriberClosed)?
    }

    /// Mark playback active from `time` and drop any cached frame
    pub fn start_playing_from(&self, time: Duration) -> Result<()> {
        self.post(SubscriberCommand::StartPlayingFrom(time))
    }

    /// Paint a hole frame of `size` through the video sink
    ///
    /// Valid in any rendering mode, including before the mode is known.
    pub fn paint_video_hole_frame(&self, size: Size) -> Result<()> {
        self.post(SubscriberCommand::PaintVideoHoleFrame(size))
    }

    /// Render tick: request a fresh frame, return the cached one
    ///
    /// Never waits for the fetch. The returned frame may be stale or `None`.
    pub fn render(&self) -> Option<VideoFrame> {
        render_tick(&self.mailbox, &self.cache)
    }

    /// Snapshot of the subscriber's state
    pub async fn state(&self) -> Result<SubscriberState> {
        let (reply, rx) = oneshot::channel();
        self.post(SubscriberCommand::State { reply })?;
        rx.await.map_err(|_| Error::SubscriberClosed)
    }

    /// Stop the subscriber, closing its broker subscription
    pub fn shutdown(&self) -> Result<()> {
        self.post(SubscriberCommand::Shutdown)
    }

    /// True while the subscriber task is accepting commands
    pub fn is_running(&self) -> bool {
        !self.mailbox.is_closed()
    }

    fn post(&self, command: SubscriberCommand) -> Result<()> {
        self.mailbox
            .send(command)
            .map_err(|_| Error::SubscriberClosed)
    }
}

/// Per-element subscriber task
pub struct OverlaySubscriber {
    config: SubscriberConfig,
    factory: VideoOverlayFactory,
    broker: GeometryBroker,
    mailbox: mpsc::UnboundedReceiver<SubscriberCommand>,
    weak_mailbox: mpsc::WeakUnboundedSender<SubscriberCommand>,
    extension: RendererExtension,
    /// Requests to the surface owner still have a receiver
    owner_connected: bool,
    /// The surface owner may still send notifications
    owner_inbound_open: bool,
    geometry: Option<Receiver<GeometryUpdate>>,
    sink: Arc<dyn VideoSink>,
    events: mpsc::Sender<SubscriberEvent>,
    cache: FrameCache,
    mode: RenderingMode,
    playing: bool,
    pull_loop: Option<AbortOnDrop>,
    handshake: Option<AbortOnDrop>,
    pending_init: bool,
    owner_status: Option<PipelineStatus>,
    subscribed: bool,
    initialized: bool,
}

impl OverlaySubscriber {
    /// Spawn a subscriber for the element that owns `factory`
    ///
    /// Returns the handle, the event receiver, and the task handle.
    /// Events must be drained; the task waits when the event channel is full.
    pub fn spawn(
        config: SubscriberConfig,
        factory: VideoOverlayFactory,
        broker: GeometryBroker,
        extension: RendererExtension,
        sink: Arc<dyn VideoSink>,
    ) -> (
        SubscriberHandle,
        mpsc::Receiver<SubscriberEvent>,
        JoinHandle<()>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity);
        let cache: FrameCache = Arc::new(Mutex::new(None));

        let handle = SubscriberHandle {
            plane_id: factory.plane_id(),
            render_interval: config.render_interval,
            mailbox: tx.clone(),
            cache: Arc::clone(&cache),
        };

        let task = Self {
            config,
            factory,
            broker,
            mailbox: rx,
            weak_mailbox: tx.downgrade(),
            extension,
            owner_connected: true,
            owner_inbound_open: true,
            geometry: None,
            sink,
            events: event_tx,
            cache,
            mode: RenderingMode::Uninitialized,
            playing: false,
            pull_loop: None,
            handshake: None,
            pending_init: false,
            owner_status: None,
            subscribed: false,
            initialized: false,
        };
        drop(tx);

        (handle, event_rx, tokio::spawn(task.run()))
    }

    fn plane_id(&self) -> OverlayPlaneId {
        self.factory.plane_id()
    }

    async fn run(mut self) {
        tracing::debug!(plane = %self.plane_id(), "Overlay subscriber started");

        loop {
            tokio::select! {
                command = self.mailbox.recv() => match command {
                    Some(command) => {
                        if !self.handle(command) {
                            break;
                        }
                    }
                    None => break,
                },
                update = next_update(&mut self.geometry) => match update {
                    Some(update) => self.on_geometry_update(update),
                    None => {
                        // Replaced by a newer registration, or the broker stopped
                        tracing::debug!(plane = %self.plane_id(), "Geometry subscription closed");
                        self.geometry = None;
                        self.subscribed = false;
                    }
                },
                message = self.extension.from_owner.recv(), if self.owner_inbound_open => match message {
                    Some(message) => self.on_client_message(message),
                    None => self.owner_inbound_open = false,
                },
                _ = self.extension.to_owner.disconnected(), if self.owner_connected => {
                    self.on_connection_error();
                }
            }
        }

        self.teardown();
    }

    /// Returns false when the subscriber should stop
    fn handle(&mut self, command: SubscriberCommand) -> bool {
        match command {
            SubscriberCommand::Initialize { reply } => {
                let _ = reply.send(self.initialize());
            }
            SubscriberCommand::Subscribed => {
                self.subscribed = true;
                tracing::debug!(plane = %self.plane_id(), "Geometry subscription acknowledged");
            }
            SubscriberCommand::HandshakeDone(status) => self.on_handshake_done(status),
            SubscriberCommand::StartPlayingFrom(time) => self.start_playing_from(time),
            SubscriberCommand::PaintVideoHoleFrame(size) => self.paint_video_hole_frame(size),
            SubscriberCommand::UpdateCurrentFrame => self.update_current_frame(),
            SubscriberCommand::FrameFetched(frame) => {
                // An empty reply keeps the previous frame
                if let Some(frame) = frame {
                    *self.cache.lock() = Some(frame);
                }
            }
            SubscriberCommand::State { reply } => {
                let _ = reply.send(self.state());
            }
            SubscriberCommand::Shutdown => return false,
        }
        true
    }

    fn initialize(&mut self) -> Result<()> {
        assert!(
            !self.pending_init && !self.initialized,
            "overlay subscriber initialized twice"
        );
        let plane_id = self.plane_id();

        let (client, updates) = channel::channel();
        let ack = self.broker.register_subscriber(plane_id, client)?;
        self.geometry = Some(updates);

        let mailbox = self.weak_mailbox.clone();
        tokio::spawn(async move {
            if ack.wait().await.is_ok() {
                if let Some(mailbox) = mailbox.upgrade() {
                    let _ = mailbox.send(SubscriberCommand::Subscribed);
                }
            }
        });

        // A failed send drops `reply`, which the handshake reads as a disconnect
        let (reply, status) = oneshot::channel();
        let _ = self
            .extension
            .to_owner
            .send(RendererMessage::Initialize { plane_id, reply });

        let mailbox = self.weak_mailbox.clone();
        self.handshake = Some(AbortOnDrop::new(tokio::spawn(async move {
            let status = status.await.unwrap_or(Err(PipelineError::Disconnected));
            if let Some(mailbox) = mailbox.upgrade() {
                let _ = mailbox.send(SubscriberCommand::HandshakeDone(status));
            }
        })));
        self.pending_init = true;

        tracing::info!(plane = %plane_id, "Overlay subscriber initializing");
        Ok(())
    }

    fn on_handshake_done(&mut self, status: PipelineStatus) {
        self.handshake = None;
        self.owner_status = Some(status);
        self.maybe_finish_init();
    }

    /// Report initialization once both the owner status and the mode are in
    fn maybe_finish_init(&mut self) {
        if !self.pending_init || self.mode == RenderingMode::Uninitialized {
            return;
        }
        let Some(status) = self.owner_status.clone() else {
            return;
        };

        self.pending_init = false;
        self.initialized = true;
        tracing::info!(
            plane = %self.plane_id(),
            mode = %self.mode,
            ok = status.is_ok(),
            "Overlay subscriber initialized"
        );
        self.emit(SubscriberEvent::Initialized(status));
    }

    fn on_client_message(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::UpdateRenderingMode(mode) => self.update_rendering_mode(mode),
            ClientMessage::PaintVideoHoleFrame(size) => self.paint_video_hole_frame(size),
            ClientMessage::Ended => self.on_ended(),
            ClientMessage::Error(error) => self.on_error(error),
            ClientMessage::Fallback(reason) => self.on_fallback(reason),
        }
    }

    fn update_rendering_mode(&mut self, mode: RenderingMode) {
        assert!(
            mode.is_valid(),
            "surface owner reported rendering mode {}",
            mode
        );

        tracing::info!(
            plane = %self.plane_id(),
            from = %self.mode,
            to = %mode,
            "Rendering mode changed"
        );
        self.mode = mode;

        match mode {
            RenderingMode::PunchOut => {
                // The surface owner presents on its own from here on
                if self.playing {
                    self.stop_pull_loop();
                } else {
                    tracing::warn!(plane = %self.plane_id(), "Not stopping frame pull loop, video is not playing");
                }
            }
            RenderingMode::TextureCallback => {
                if self.playing {
                    self.start_pull_loop();
                } else {
                    tracing::warn!(plane = %self.plane_id(), "Not starting frame pull loop, playback has not started");
                }
            }
            RenderingMode::Uninitialized | RenderingMode::Invalid => {}
        }

        self.maybe_finish_init();
    }

    fn start_playing_from(&mut self, time: Duration) {
        self.set_playing(true);
        self.cache.lock().take();

        if self
            .extension
            .to_owner
            .send(RendererMessage::StartPlayingFrom(time))
            .is_err()
        {
            tracing::debug!(plane = %self.plane_id(), "Surface owner gone, playback start not forwarded");
        }
    }

    fn on_ended(&mut self) {
        self.set_playing(false);
        self.emit(SubscriberEvent::Ended);
    }

    fn on_error(&mut self, error: PipelineError) {
        self.set_playing(false);
        tracing::warn!(plane = %self.plane_id(), error = %error, "Playback error");
        self.emit(SubscriberEvent::Error(error));
    }

    fn on_fallback(&mut self, reason: PipelineError) {
        self.set_playing(false);
        tracing::warn!(plane = %self.plane_id(), reason = %reason, "Surface owner requested fallback");
        self.emit(SubscriberEvent::Fallback(reason));
    }

    fn on_connection_error(&mut self) {
        self.owner_connected = false;
        self.set_playing(false);
        tracing::error!(plane = %self.plane_id(), "Lost connection to surface owner");
        self.emit(SubscriberEvent::Error(PipelineError::Disconnected));
    }

    fn on_geometry_update(&mut self, update: GeometryUpdate) {
        let plane_id = self.plane_id();
        let bounds = update.rect.to_enclosing_rect();
        // Only the bounds cross to the surface owner
        tracing::debug!(
            plane = %plane_id,
            rect = %update.rect,
            bounds = %bounds,
            transform = %update.transform,
            "Geometry update"
        );

        if self
            .extension
            .to_owner
            .send(RendererMessage::SetVideoBounds { plane_id, bounds })
            .is_err()
        {
            tracing::debug!(plane = %plane_id, "Surface owner gone, bounds not forwarded");
        }
    }

    fn paint_video_hole_frame(&mut self, size: Size) {
        let frame = self.factory.create_frame(size);
        tracing::debug!(plane = %self.plane_id(), size = %frame.size(), hole = frame.is_hole(), "Painting hole frame");
        self.sink.paint_single_frame(frame);
    }

    fn update_current_frame(&mut self) {
        if self.mode != RenderingMode::TextureCallback {
            return;
        }

        let (reply, frame) = oneshot::channel();
        if self
            .extension
            .to_owner
            .send(RendererMessage::GetCurrentVideoFrame { reply })
            .is_err()
        {
            return;
        }

        let mailbox = self.weak_mailbox.clone();
        tokio::spawn(async move {
            if let Ok(frame) = frame.await {
                if let Some(mailbox) = mailbox.upgrade() {
                    let _ = mailbox.send(SubscriberCommand::FrameFetched(frame));
                }
            }
        });
    }

    fn set_playing(&mut self, playing: bool) {
        if playing == self.playing {
            return;
        }

        // The pull loop only runs in texture-callback mode
        if self.mode == RenderingMode::TextureCallback {
            if playing {
                self.start_pull_loop();
            } else {
                self.stop_pull_loop();
            }
        }
        self.playing = playing;
    }

    fn start_pull_loop(&mut self) {
        if self.pull_loop.is_some() {
            return;
        }

        tracing::debug!(
            plane = %self.plane_id(),
            interval_us = self.config.render_interval.as_micros() as u64,
            "Frame pull loop started"
        );
        self.pull_loop = Some(AbortOnDrop::new(spawn_pull_loop(
            self.config.render_interval,
            self.weak_mailbox.clone(),
            Arc::clone(&self.cache),
            Arc::clone(&self.sink),
        )));
    }

    fn stop_pull_loop(&mut self) {
        if self.pull_loop.take().is_some() {
            tracing::debug!(plane = %self.plane_id(), "Frame pull loop stopped");
        }
    }

    fn state(&self) -> SubscriberState {
        SubscriberState {
            mode: self.mode,
            playing: self.playing,
            pull_loop_running: self
                .pull_loop
                .as_ref()
                .is_some_and(|pull_loop| !pull_loop.is_finished()),
            subscribed: self.subscribed,
            initialized: self.initialized,
        }
    }

    /// Drops the event if the consumer has fallen behind
    fn emit(&self, event: SubscriberEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(plane = %self.plane_id(), event = ?event, "Event channel full, event dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    fn teardown(&mut self) {
        self.set_playing(false);
        assert!(
            self.pull_loop.is_none(),
            "frame pull loop still running at teardown"
        );

        if self.handshake.take().is_some() {
            tracing::debug!(plane = %self.plane_id(), "Cancelled pending surface owner handshake");
        }
        // Closing the update channel ends the broker registration
        self.geometry = None;

        tracing::info!(plane = %self.plane_id(), "Overlay subscriber stopped");
    }
}

/// Next geometry update, or never if not subscribed
async fn next_update(updates: &mut Option<Receiver<GeometryUpdate>>) -> Option<GeometryUpdate> {
    match updates {
        Some(updates) => updates.recv().await,
        None => std::future::pending().await,
    }
}

fn render_tick(
    mailbox: &mpsc::UnboundedSender<SubscriberCommand>,
    cache: &FrameCache,
) -> Option<VideoFrame> {
    // Fetched asynchronously; picked up by a later tick
    let _ = mailbox.send(SubscriberCommand::UpdateCurrentFrame);
    cache.lock().clone()
}

fn spawn_pull_loop(
    interval: Duration,
    mailbox: mpsc::WeakUnboundedSender<SubscriberCommand>,
    cache: FrameCache,
    sink: Arc<dyn VideoSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Fields set directly skip the builder's clamp
        let mut ticker = tokio::time::interval(interval.max(MIN_RENDER_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let Some(mailbox) = mailbox.upgrade() else {
                return;
            };
            if let Some(frame) = render_tick(&mailbox, &cache) {
                sink.present(frame);
            }
        }
    })
}
