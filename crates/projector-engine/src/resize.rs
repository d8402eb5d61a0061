//! Debounced resize.
//!
//! A burst of resize events collapses into one application after the output has
//! been quiet for `window`. Applying a size equal to the last applied one is a no-op.

use std::time::{Duration, Instant};

use crate::coords::Viewport;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    window: Duration,
    pending: Option<(Viewport, Instant)>,
    applied: Viewport,
}

impl ResizeDebouncer {
    pub fn new(initial: Viewport, window: Duration) -> Self {
        Self {
            window,
            pending: None,
            applied: initial,
        }
    }

    pub fn applied(&self) -> Viewport {
        self.applied
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Records a resize event. Invalid (zero) sizes are ignored.
    pub fn push(&mut self, size: Viewport, now: Instant) {
        if size.is_valid() {
            self.pending = Some((size, now));
        }
    }

    /// Returns the size to apply once the quiet window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Viewport> {
        let (size, at) = self.pending?;
        if now.saturating_duration_since(at) < self.window {
            return None;
        }
        self.pending = None;

        if size == self.applied {
            return None;
        }
        self.applied = size;
        Some(size)
    }
}
