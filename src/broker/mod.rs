//! Geometry broker: N:M routing of overlay geometry
//!
//! The broker sits in the coordinator process between the compositor (the
//! *setter*) and the video elements (the *subscribers*). It keeps one
//! subscriber per [`OverlayPlaneId`](crate::plane::OverlayPlaneId) and at
//! most one active setter.
//!
//! # Architecture
//!
//! ```text
//!   GeometrySetter ──► setter pump ─┐
//!   (compositor)                    │
//!                                   ▼
//!   GeometryBroker ──────────► mailbox ──► BrokerTask
//!   (any thread)                            │ clients: HashMap<PlaneId, Sender>
//!                                           │ setter:  Option<SetterSlot>
//!                                           ▼
//!                              Sender<GeometryUpdate> ──► subscriber
//! ```
//!
//! # Policies
//!
//! - Registering a plane that already has a subscriber replaces it; the
//!   replaced subscriber's channel is closed.
//! - A disconnect only evicts the registration it was observed on, never a
//!   newer registration for the same plane.
//! - Binding a setter revokes the previous one.
//! - Geometry for a plane without a subscriber is dropped. This is the
//!   normal startup/teardown race, not an error.

pub mod message;
pub mod service;
pub mod setter;
pub mod stats;

pub use message::SetterMessage;
pub use service::{GeometryBroker, SubscribeAck};
pub use setter::GeometrySetter;
pub use stats::BrokerStats;
