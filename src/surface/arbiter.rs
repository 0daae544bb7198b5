//! Hardware overlay surface arbiter
//!
//! The platform exposes a single overlay surface at a time, and only one
//! player may present on it. [`SurfaceArbiter`] is the one place that
//! decides who that player is. Unlike the rest of the pipeline it is called
//! from genuinely concurrent threads (platform notifications on one, decoder
//! threads on others), so the surface handle, the holder and the reset flag
//! sit together behind one mutex.
//!
//! ```text
//!   platform ── surface_changed ──►┌──────────────────────────┐
//!                                  │ SurfaceArbiter           │
//!   SurfaceConsumer ── acquire ───►│  Mutex<surface, holder,  │
//!   (one per player)  ◄─ handle ── │        reset flag>       │
//!                     ── release ─►└──────────────────────────┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{Result, SurfaceError};
use crate::geometry::Size;

use super::holder::{SurfaceHandle, SurfaceHolder};

/// Current owner of the surface
struct HolderSlot {
    consumer: u64,
    holder: Weak<dyn SurfaceHolder>,
}

#[derive(Default)]
struct SurfaceState {
    surface: Option<SurfaceHandle>,
    holder: Option<HolderSlot>,
    /// Reset the surface on the next clear if it is portrait or square
    reset_on_clear: bool,
}

/// Exclusive-ownership guard for the platform's overlay surface
pub struct SurfaceArbiter {
    state: Mutex<SurfaceState>,
    next_consumer: AtomicU64,
}

impl SurfaceArbiter {
    /// Create an arbiter with no surface
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SurfaceState::default()),
            next_consumer: AtomicU64::new(1),
        })
    }

    /// Create a consumer for one player
    ///
    /// `holder` is told when a surface it holds is destroyed. The consumer
    /// releases the surface when dropped.
    pub fn consumer(self: &Arc<Self>, holder: Weak<dyn SurfaceHolder>) -> SurfaceConsumer {
        SurfaceConsumer {
            arbiter: Arc::clone(self),
            id: self.next_consumer.fetch_add(1, Ordering::Relaxed),
            holder,
        }
    }

    /// True if a surface exists and nobody holds it
    pub fn is_available(&self) -> bool {
        let state = self.state.lock();
        state.surface.is_some() && state.holder.is_none()
    }

    /// True if some consumer holds the surface
    pub fn is_held(&self) -> bool {
        self.state.lock().holder.is_some()
    }

    /// Platform notification: the surface was replaced or destroyed
    ///
    /// The current holder, if any, is notified and evicted before the old
    /// handle is dropped.
    pub fn surface_changed(&self, surface: Option<SurfaceHandle>) {
        let mut state = self.state.lock();

        if let Some(slot) = state.holder.take() {
            if let Some(holder) = slot.holder.upgrade() {
                holder.on_surface_destroyed();
            }
            tracing::info!(consumer = slot.consumer, "Surface holder evicted");
        }

        let had_surface = state.surface.is_some();
        state.surface = surface;

        match &state.surface {
            Some(surface) => {
                tracing::info!(size = %surface.size(), replaced = had_surface, "Overlay surface created");
            }
            None if had_surface => tracing::info!("Overlay surface destroyed"),
            None => {}
        }
    }

    /// Platform notification: reset the surface after portrait playback
    pub fn set_need_reset_surface(&self) {
        self.state.lock().reset_on_clear = true;
    }

    /// Current surface dimensions, independent of who holds it
    ///
    /// Fails with [`SurfaceError::NoSurface`] while no surface exists, which
    /// happens transiently around surface changes.
    pub fn surface_size(&self) -> Result<Size> {
        let state = self.state.lock();
        let surface = state.surface.as_ref().ok_or(SurfaceError::NoSurface)?;
        Ok(surface.size())
    }

    /// Clear the surface after playback, resetting it if needed
    ///
    /// Resets when `force_reset` is set, or when a reset was requested and
    /// the surface is portrait or square. Returns true if a reset was issued.
    /// Holds the lock throughout so the surface cannot be released mid-call.
    pub fn clear_surface(&self, force_reset: bool) -> bool {
        let state = self.state.lock();
        let Some(surface) = state.surface.as_ref() else {
            return false;
        };

        let reset = force_reset || (state.reset_on_clear && {
            let size = surface.size();
            size.width <= size.height
        });
        if reset {
            tracing::info!(forced = force_reset, size = %surface.size(), "Resetting overlay surface");
            surface.reset();
        }
        reset
    }

    fn acquire(&self, consumer: u64, holder: &Weak<dyn SurfaceHolder>) -> Option<SurfaceHandle> {
        let mut state = self.state.lock();

        if let Some(slot) = &state.holder {
            tracing::warn!(
                consumer = consumer,
                holder = slot.consumer,
                "Surface acquisition refused, already held"
            );
            return None;
        }
        let Some(surface) = state.surface.clone() else {
            tracing::warn!(consumer = consumer, "Surface acquisition refused, no surface");
            return None;
        };

        state.holder = Some(HolderSlot {
            consumer,
            holder: holder.clone(),
        });
        tracing::info!(consumer = consumer, "Surface acquired");
        Some(surface)
    }

    /// Returns true if `consumer` was the holder
    fn release(&self, consumer: u64) -> bool {
        let mut state = self.state.lock();
        match &state.holder {
            Some(slot) if slot.consumer == consumer => {
                state.holder = None;
                tracing::info!(consumer = consumer, "Surface released");
                true
            }
            _ => false,
        }
    }

    fn is_holder(&self, consumer: u64) -> bool {
        self.state
            .lock()
            .holder
            .as_ref()
            .is_some_and(|slot| slot.consumer == consumer)
    }
}

/// One player's access to the overlay surface
///
/// Releases the surface on drop if it still holds it.
pub struct SurfaceConsumer {
    arbiter: Arc<SurfaceArbiter>,
    id: u64,
    holder: Weak<dyn SurfaceHolder>,
}

impl SurfaceConsumer {
    /// Take the surface
    ///
    /// Returns `None` immediately if another consumer holds it or no surface
    /// exists; the caller should fall back to texture presentation.
    pub fn acquire(&self) -> Option<SurfaceHandle> {
        self.arbiter.acquire(self.id, &self.holder)
    }

    /// Give the surface back; ignored unless this consumer holds it
    pub fn release(&self) {
        if !self.arbiter.release(self.id) {
            tracing::warn!(consumer = self.id, "Surface release ignored, not the holder");
        }
    }

    /// True while this consumer holds the surface
    pub fn is_holder(&self) -> bool {
        self.arbiter.is_holder(self.id)
    }
}

impl Drop for SurfaceConsumer {
    fn drop(&mut self) {
        self.arbiter.release(self.id);
    }
}
