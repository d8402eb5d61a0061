use crate::coords::Viewport;
use crate::error::FrameError;
use crate::orchestrator::{FrameRenderer, Stage};

use super::{
    OffscreenPass, OverlayTexture, PostChain, PostEffect, PrimaryInputs, PrimaryPass, RenderCtx,
    TextureCache,
};

/// GPU resources that outlive a frame: passes, targets, uploaded textures.
pub struct PassSet {
    pub offscreen: OffscreenPass,
    pub primary: PrimaryPass,
    pub post: PostChain,
    textures: TextureCache,
    text: OverlayTexture,
    trail: OverlayTexture,
}

impl PassSet {
    pub fn new(size: Viewport) -> Self {
        Self {
            offscreen: OffscreenPass::new(size),
            primary: PrimaryPass::new(),
            post: PostChain::new(size),
            textures: TextureCache::new(),
            text: OverlayTexture::new(),
            trail: OverlayTexture::new(),
        }
    }

    pub fn add_post_effect(&mut self, effect: Box<dyn PostEffect>) {
        self.post.push(effect);
    }
}

/// [`FrameRenderer`] recording into one frame's encoder.
///
/// Built per frame around the acquired surface view; every pass records into the
/// same encoder, which the caller submits afterwards.
pub struct GpuFrameRenderer<'a> {
    ctx: RenderCtx<'a>,
    encoder: &'a mut wgpu::CommandEncoder,
    surface_view: &'a wgpu::TextureView,
    passes: &'a mut PassSet,
}

impl<'a> GpuFrameRenderer<'a> {
    pub fn new(
        ctx: RenderCtx<'a>,
        encoder: &'a mut wgpu::CommandEncoder,
        surface_view: &'a wgpu::TextureView,
        passes: &'a mut PassSet,
    ) -> Self {
        Self {
            ctx,
            encoder,
            surface_view,
            passes,
        }
    }
}

impl FrameRenderer for GpuFrameRenderer<'_> {
    fn resize(&mut self, size: Viewport) -> Result<(), FrameError> {
        self.passes.offscreen.resize(size);
        self.passes.post.resize(size);
        Ok(())
    }

    fn render_offscreen(&mut self, stage: &mut Stage) -> Result<(), FrameError> {
        self.passes.textures.retain_live(&stage.textures);
        self.passes.offscreen.render(
            &self.ctx,
            self.encoder,
            &stage.background,
            &stage.cameras,
            &stage.textures,
            &mut self.passes.textures,
        )
    }

    fn render_primary(&mut self, stage: &mut Stage) -> Result<(), FrameError> {
        let PassSet {
            offscreen,
            primary,
            post,
            text,
            trail,
            ..
        } = &mut *self.passes;

        text.sync(&self.ctx, &mut stage.text);
        trail.sync(&self.ctx, &mut stage.trail);

        let missing = |pass| FrameError::MissingTarget { pass };
        let background = offscreen.target();
        let inputs = PrimaryInputs {
            background: (background.view().ok_or(missing("offscreen"))?, background.generation()),
            text: (text.view().ok_or(missing("text overlay"))?, text.generation()),
            trail: (trail.view().ok_or(missing("mouse trail"))?, trail.generation()),
        };

        let output = if post.is_empty() {
            self.surface_view
        } else {
            post.input_view(&self.ctx).ok_or(missing("post"))?
        };

        primary.render(
            &self.ctx,
            self.encoder,
            output,
            self.ctx.surface_format,
            &inputs,
            &stage.primary,
        )
    }

    fn post_stage_count(&self) -> usize {
        self.passes.post.len()
    }

    fn render_post(&mut self, stage: &mut Stage) -> Result<(), FrameError> {
        self.passes.post.update(stage.shader_time);
        self.passes.post.run(&self.ctx, self.encoder, self.surface_view)
    }
}
