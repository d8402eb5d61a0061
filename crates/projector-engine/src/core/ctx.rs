use std::time::Instant;

use winit::window::{Window, WindowId};

use crate::coords::Viewport;
use crate::device::{Gpu, SurfaceErrorAction};
use crate::error::FrameError;
use crate::events::{EventChannel, ViewportEvent};
use crate::render::RenderCtx;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Current drawable size in physical pixels.
    pub fn viewport(&self) -> Viewport {
        Viewport::from(self.window.inner_size())
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub events: &'a EventChannel<ViewportEvent>,
    /// Instant the frame callback started; the app's clock ticks from it.
    pub now: Instant,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires the surface, calls `draw` with a ready [`RenderCtx`], encoder and
    /// surface view, then submits and presents.
    ///
    /// Surface loss is handled here; only a fatal surface error ends the app. A
    /// `draw` error is logged and the surface is cleared to black over whatever was
    /// recorded, so the frame never shows undefined swapchain contents.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(RenderCtx<'_>, &mut wgpu::CommandEncoder, &wgpu::TextureView) -> Result<(), FrameError>,
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let action = self.gpu.handle_surface_error(err);
                if action == SurfaceErrorAction::Fatal {
                    log::error!("surface error is fatal, exiting");
                    return AppControl::Exit;
                }
                return AppControl::Continue;
            }
        };

        let rctx = RenderCtx::new(self.gpu.device(), self.gpu.queue(), self.gpu.surface_format());

        if let Some(color) = failed_frame_clear(draw(rctx, &mut frame.encoder, &frame.view)) {
            clear_view(&mut frame.encoder, &frame.view, color);
        }

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);

        AppControl::Continue
    }
}

/// Clear color for a frame whose `draw` failed, or `None` when it succeeded.
fn failed_frame_clear(result: Result<(), FrameError>) -> Option<wgpu::Color> {
    match result {
        Ok(()) => None,
        Err(err) => {
            log::debug!("frame dropped, presenting black: {err}");
            Some(wgpu::Color::BLACK)
        }
    }
}

fn clear_view(encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, color: wgpu::Color) {
    let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("projector failed frame clear"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(color),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_draw_needs_no_clear() {
        assert_eq!(failed_frame_clear(Ok(())), None);
    }

    #[test]
    fn failed_draw_clears_to_black() {
        let failed = Err(FrameError::MissingTarget { pass: "offscreen" });
        assert_eq!(failed_frame_clear(failed), Some(wgpu::Color::BLACK));
    }
}
