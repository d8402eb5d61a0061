//! CPU-rasterized single-channel textures sampled by the primary pass.
//!
//! Each canvas owns its pixel buffer. The renderer uploads it once per frame,
//! before the primary pass, and only when the canvas reports it changed.

mod text;
mod trail;

pub use text::TextCanvas;
pub use trail::{MouseTrail, TrailConfig};

use crate::coords::Viewport;

/// A texture whose contents are produced on the CPU every frame.
pub trait DynamicTexture {
    fn label(&self) -> &'static str;

    /// Pixel size of [`pixels`](Self::pixels).
    fn size(&self) -> Viewport;

    /// Row-major R8 pixels, `size.width * size.height` bytes.
    fn pixels(&self) -> &[u8];

    /// Reallocates for a new output size. Implementations choose their own resolution.
    fn resize(&mut self, output: Viewport);

    fn update(&mut self, time: f32, dt: f32);

    /// Returns whether pixels changed since the last call, and clears the flag.
    fn take_dirty(&mut self) -> bool;
}

/// Zeroed R8 buffer for `size`.
pub(crate) fn blank(size: Viewport) -> Vec<u8> {
    vec![0; size.width as usize * size.height as usize]
}
