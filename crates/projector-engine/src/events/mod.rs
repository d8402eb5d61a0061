//! Explicit viewport event channel.
//!
//! The window runtime publishes platform events here instead of the app reaching
//! into a global bus. Consumers hold a [`Subscription`], which unsubscribes when
//! dropped, and drain it between frames.

mod channel;

pub use channel::{EventChannel, Subscription};

/// Keys the runtime forwards. Everything else arrives as `Other`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Digit(u8),
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    Escape,
    Other,
}

/// Platform events relevant to the renderer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ViewportEvent {
    /// Output size changed (physical pixels).
    Resized { width: u32, height: u32 },

    /// Pointer moved; coordinates normalized to `[-1, 1]`, +Y down.
    PointerMoved { x: f32, y: f32 },

    /// Primary pointer button went down or up.
    PointerButton { pressed: bool },

    /// Wheel scrolled; positive is away from the user, in lines.
    Scrolled { lines: f32 },

    /// A key went down (repeats included).
    KeyPressed(Key),
}

/// Maps a pixel position to the `[-1, 1]` range used by pointer events.
pub fn normalize_pointer(px: f64, py: f64, width: u32, height: u32) -> (f32, f32) {
    let w = width.max(1) as f64;
    let h = height.max(1) as f64;
    ((2.0 * (px / w - 0.5)) as f32, (2.0 * (py / h - 0.5)) as f32)
}
