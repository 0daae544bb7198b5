//! End-to-end geometry routing across the compositor, broker, subscriber and
//! surface owner roles.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::time::timeout;
use tokio_test::{assert_err, assert_ok, assert_pending, assert_ready};

use punchout::broker::{BrokerStats, GeometryBroker};
use punchout::channel::{self, Receiver};
use punchout::geometry::{GeometryUpdate, OverlayTransform, Rect, RectF, Size};
use punchout::pipeline::{OverlayPipeline, PipelineConfig};
use punchout::plane::OverlayPlaneId;
use punchout::strategy::{DrawQuad, RenderPass, TargetRectCandidates};
use punchout::subscriber::{
    extension, RendererMessage, SubscriberHandle, SurfaceOwnerEndpoint, VideoFrame,
    VideoOverlayFactory, VideoSink,
};
use punchout::surface::{PlatformSurface, SurfaceArbiter, SurfaceHolder};

const WAIT: Duration = Duration::from_secs(2);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct NullSink;

impl VideoSink for NullSink {
    fn paint_single_frame(&self, _frame: VideoFrame) {}

    fn present(&self, _frame: VideoFrame) {}
}

async fn subscribe(broker: &GeometryBroker, plane_id: OverlayPlaneId) -> Receiver<GeometryUpdate> {
    let (tx, rx) = channel::channel();
    let ack = assert_ok!(broker.register_subscriber(plane_id, tx));
    assert_ok!(ack.wait().await);
    rx
}

async fn wait_for_stats(broker: &GeometryBroker, pred: impl Fn(&BrokerStats) -> bool) -> BrokerStats {
    for _ in 0..400 {
        let stats = assert_ok!(broker.stats().await);
        if pred(&stats) {
            return stats;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("broker never reached the expected state");
}

/// Spawn a subscriber through the pipeline and complete its handshake
async fn initialized_subscriber(
    pipeline: &OverlayPipeline,
) -> (SubscriberHandle, SurfaceOwnerEndpoint) {
    let (ext, mut owner) = extension::connect();
    let (handle, _events, _task) = pipeline.spawn_subscriber(ext, Arc::new(NullSink));

    assert_ok!(handle.initialize().await);
    match timeout(WAIT, owner.recv()).await.unwrap() {
        Some(RendererMessage::Initialize { plane_id, reply }) => {
            assert_eq!(plane_id, handle.plane_id());
            reply.send(Ok(())).unwrap();
        }
        other => panic!("expected Initialize, got {:?}", other),
    }

    for _ in 0..400 {
        if assert_ok!(handle.state().await).subscribed {
            return (handle, owner);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("subscription never acknowledged");
}

async fn next_bounds(owner: &mut SurfaceOwnerEndpoint) -> (OverlayPlaneId, Rect) {
    loop {
        match timeout(WAIT, owner.recv()).await.unwrap() {
            Some(RendererMessage::SetVideoBounds { plane_id, bounds }) => return (plane_id, bounds),
            Some(_) => continue,
            None => panic!("subscriber hung up"),
        }
    }
}

#[tokio::test]
async fn test_scenario_geometry_reaches_surface_owner() {
    init_tracing();
    let pipeline = OverlayPipeline::start(PipelineConfig::default());
    assert_ok!(pipeline.connect_compositor());
    let (handle, mut owner) = initialized_subscriber(&pipeline).await;

    let setter = pipeline.setter_link().get().unwrap();
    assert_ok!(setter.set_geometry(
        handle.plane_id(),
        GeometryUpdate::new(RectF::from_ltrb(10.0, 20.0, 110.0, 220.0), OverlayTransform::Identity),
    ));

    let (plane_id, bounds) = next_bounds(&mut owner).await;
    assert_eq!(plane_id, handle.plane_id());
    assert_eq!(bounds, Rect::new(10, 20, 100, 200));
}

#[tokio::test]
async fn test_scenario_compositor_frame_to_bounds() {
    init_tracing();
    let pipeline = OverlayPipeline::start(PipelineConfig::default());
    assert_ok!(pipeline.connect_compositor());
    let mut strategy = pipeline.underlay_strategy();
    let (handle, mut owner) = initialized_subscriber(&pipeline).await;

    let mut pass = RenderPass::new(Rect::new(0, 0, 1920, 1080));
    pass.push(DrawQuad::texture(Rect::new(0, 0, 1920, 1080), 1))
        .push(DrawQuad::video_hole(Rect::new(10, 20, 100, 200), handle.plane_id()));

    let frame = strategy.process(&pass, &TargetRectCandidates);
    assert!(strategy.is_active());
    assert!(frame.quads.iter().all(|quad| !quad.is_video_hole()));

    assert_eq!(
        next_bounds(&mut owner).await,
        (handle.plane_id(), Rect::new(10, 20, 100, 200))
    );
}

#[tokio::test]
async fn test_scenario_only_addressed_plane_receives() {
    init_tracing();
    let (broker, _task) = GeometryBroker::spawn();
    let p1 = OverlayPlaneId::new();
    let p2 = OverlayPlaneId::new();
    let mut c1 = subscribe(&broker, p1).await;
    let mut c2 = subscribe(&broker, p2).await;
    let setter = assert_ok!(broker.connect_setter());

    let update = GeometryUpdate::identity(RectF::new(0.0, 0.0, 320.0, 240.0));
    assert_ok!(setter.set_geometry(p1, update));

    assert_eq!(timeout(WAIT, c1.recv()).await.unwrap(), Some(update));
    wait_for_stats(&broker, |s| s.updates_delivered == 1).await;

    let mut pending = tokio_test::task::spawn(c2.recv());
    assert_pending!(pending.poll());
}

#[tokio::test]
async fn test_scenario_reconnect_after_disconnect() {
    init_tracing();
    let (broker, _task) = GeometryBroker::spawn();
    let plane_id = OverlayPlaneId::new();
    let setter = assert_ok!(broker.connect_setter());

    let first = subscribe(&broker, plane_id).await;
    drop(first);
    wait_for_stats(&broker, |s| s.subscriber_count == 0).await;

    let mut second = subscribe(&broker, plane_id).await;
    let update = GeometryUpdate::identity(RectF::new(5.0, 5.0, 50.0, 50.0));
    assert_ok!(setter.set_geometry(plane_id, update));

    assert_eq!(timeout(WAIT, second.recv()).await.unwrap(), Some(update));
    let stats = wait_for_stats(&broker, |s| s.updates_delivered == 1).await;
    assert_eq!(stats.subscriber_count, 1);
    assert_eq!(stats.updates_dropped, 0);
}

#[tokio::test]
async fn test_reregistration_routes_to_latest_only() {
    init_tracing();
    let (broker, _task) = GeometryBroker::spawn();
    let plane_id = OverlayPlaneId::new();
    let mut c1 = subscribe(&broker, plane_id).await;
    let mut c2 = subscribe(&broker, plane_id).await;
    let setter = assert_ok!(broker.connect_setter());

    let update = GeometryUpdate::identity(RectF::new(1.0, 2.0, 3.0, 4.0));
    assert_ok!(setter.set_geometry(plane_id, update));

    assert_eq!(timeout(WAIT, c2.recv()).await.unwrap(), Some(update));
    // The replaced registration was closed without ever seeing the update
    assert_eq!(timeout(WAIT, c1.recv()).await.unwrap(), None);
}

#[tokio::test]
async fn test_unknown_plane_is_dropped_quietly() {
    init_tracing();
    let (broker, _task) = GeometryBroker::spawn();
    let setter = assert_ok!(broker.connect_setter());

    assert_ok!(setter.set_geometry(OverlayPlaneId::new(), GeometryUpdate::default()));

    let stats = wait_for_stats(&broker, |s| s.updates_dropped == 1).await;
    assert_eq!(stats.updates_delivered, 0);
    assert!(broker.is_running());
}

#[tokio::test]
async fn test_second_bind_revokes_first_setter() {
    init_tracing();
    let (broker, _task) = GeometryBroker::spawn();
    let plane_id = OverlayPlaneId::new();
    let mut client = subscribe(&broker, plane_id).await;

    let s1 = assert_ok!(broker.connect_setter());
    let s2 = assert_ok!(broker.connect_setter());
    timeout(WAIT, s1.revoked()).await.unwrap();

    assert_err!(s1.set_geometry(plane_id, GeometryUpdate::default()));
    let update = GeometryUpdate::identity(RectF::new(0.0, 0.0, 8.0, 8.0));
    assert_ok!(s2.set_geometry(plane_id, update));
    assert_eq!(timeout(WAIT, client.recv()).await.unwrap(), Some(update));

    let stats = assert_ok!(broker.stats().await);
    assert!(stats.has_setter);
    assert_eq!(stats.setter_generation, Some(1));
}

#[test]
fn test_empty_hole_frame_has_area() {
    let factory = VideoOverlayFactory::new();
    let frame = factory.create_frame(Size::new(0, 0));
    assert_eq!(frame.size(), Size::new(1, 1));
    assert!(!frame.is_hole());
}

#[derive(Debug)]
struct Screen;

impl PlatformSurface for Screen {
    fn size(&self) -> Size {
        Size::new(1920, 1080)
    }

    fn reset(&self) {}
}

struct Player;

impl SurfaceHolder for Player {
    fn on_surface_destroyed(&self) {}
}

fn holder(player: &Arc<Player>) -> Weak<dyn SurfaceHolder> {
    let as_holder: Arc<dyn SurfaceHolder> = player.clone();
    Arc::downgrade(&as_holder)
}

#[test]
fn test_scenario_surface_handoff() {
    let arbiter = SurfaceArbiter::new();
    arbiter.surface_changed(Some(Arc::new(Screen)));
    let (px, py) = (Arc::new(Player), Arc::new(Player));
    let x = arbiter.consumer(holder(&px));
    let y = arbiter.consumer(holder(&py));

    assert!(x.acquire().is_some());
    assert!(y.acquire().is_none());

    x.release();
    assert!(y.acquire().is_some());
    assert!(!arbiter.is_available());
}

#[tokio::test]
async fn test_pending_recv_completes_on_update() {
    let (broker, _task) = GeometryBroker::spawn();
    let plane_id = OverlayPlaneId::new();
    let mut client = subscribe(&broker, plane_id).await;
    let setter = assert_ok!(broker.connect_setter());

    let update = GeometryUpdate::identity(RectF::new(0.0, 0.0, 1.0, 1.0));
    {
        let mut recv = tokio_test::task::spawn(client.recv());
        assert_pending!(recv.poll());

        assert_ok!(setter.set_geometry(plane_id, update));
        wait_for_stats(&broker, |s| s.updates_delivered == 1).await;

        assert!(recv.is_woken());
        assert_eq!(assert_ready!(recv.poll()), Some(update));
    }
}
