//! Error types
//!
//! Only conditions a caller can act on surface as `Err`. Expected races
//! (an update for a plane nobody subscribed to, a stale disconnect, a
//! duplicate release) are logged and absorbed where they happen, and wiring
//! mistakes are assertions rather than errors.

use std::fmt;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The geometry broker task is gone
    BrokerClosed,
    /// The overlay subscriber task is gone
    SubscriberClosed,
    /// The peer end of a channel was dropped
    ChannelClosed,
    /// Hardware surface error
    Surface(SurfaceError),
    /// Media pipeline failure reported by the surface owner
    Pipeline(PipelineError),
}

/// Errors reported by the hardware surface arbiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceError {
    /// The platform currently exposes no overlay surface
    NoSurface,
}

/// Pipeline status failures surfaced to the video element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Connection to the surface-owning process was lost
    Disconnected,
    /// The surface owner refused to initialize the renderer
    InitializationFailed(String),
    /// Decoder reported an error during playback
    Decode(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BrokerClosed => write!(f, "Geometry broker is closed"),
            Error::SubscriberClosed => write!(f, "Overlay subscriber is closed"),
            Error::ChannelClosed => write!(f, "Channel peer disconnected"),
            Error::Surface(e) => write!(f, "Surface error: {}", e),
            Error::Pipeline(e) => write!(f, "Pipeline error: {}", e),
        }
    }
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::NoSurface => write!(f, "No overlay surface available"),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Disconnected => write!(f, "Surface owner disconnected"),
            PipelineError::InitializationFailed(reason) => {
                write!(f, "Renderer initialization failed: {}", reason)
            }
            PipelineError::Decode(reason) => write!(f, "Decode error: {}", reason),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Surface(e) => Some(e),
            Error::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for SurfaceError {}

impl std::error::Error for PipelineError {}

impl From<SurfaceError> for Error {
    fn from(e: SurfaceError) -> Self {
        Error::Surface(e)
    }
}

impl From<PipelineError> for Error {
    fn from(e: PipelineError) -> Self {
        Error::Pipeline(e)
    }
}
