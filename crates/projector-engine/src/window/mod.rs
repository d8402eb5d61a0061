//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the window, wires them to the GPU layer, and
//! publishes translated platform events on an [`EventChannel`](crate::events::EventChannel).

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
