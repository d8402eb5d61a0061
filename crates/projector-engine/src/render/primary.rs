use bytemuck::{Pod, Zeroable};

use crate::coords::Viewport;
use crate::error::FrameError;
use crate::params::PrimaryParams;
use crate::scene::Camera;

use super::common::{
    begin_pass, binding_size, fullscreen_pipeline, linear_clamp_sampler, sampler_entry,
    texture_entry, uniform_entry,
};
use super::RenderCtx;

const PASS: &str = "primary";

/// Uniform block of the primary pass.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PrimaryUniforms {
    /// Foreground camera view-projection; places the full-screen triangle.
    pub clip_from_world: [[f32; 4]; 4],
    /// Foreground frustum as `(left, right, bottom, top)` on the z = 0 plane.
    pub frustum: [f32; 4],
    pub resolution: [f32; 2],
    pub time: f32,
    pub rotation: f32,
    pub line_width: f32,
    pub repeat: f32,
    pub time_multi: f32,
    pub noise_atten: f32,
}

impl PrimaryUniforms {
    pub fn new(resolution: Viewport, params: PrimaryParams) -> Self {
        let mut uniforms = Self::zeroed();
        uniforms.set_resolution(resolution);
        uniforms.set_params(params);
        uniforms
    }

    /// Copies the foreground camera. Call again whenever its aspect changes.
    pub fn set_camera(&mut self, camera: &Camera) {
        self.clip_from_world = camera.view_projection().to_cols_array_2d();
        let (left, right, bottom, top) = camera.frustum_bounds().unwrap_or((-1.0, 1.0, -1.0, 1.0));
        self.frustum = [left, right, bottom, top];
    }

    pub fn set_resolution(&mut self, resolution: Viewport) {
        self.resolution = resolution.as_vec2();
    }

    pub fn set_params(&mut self, params: PrimaryParams) {
        self.rotation = params.rotation;
        self.line_width = params.line_width;
        self.repeat = params.repeat;
        self.time_multi = params.time_multi;
        self.noise_atten = params.noise_atten;
    }
}

/// Views sampled by the primary pass, with generations to detect reallocation.
pub struct PrimaryInputs<'a> {
    pub background: (&'a wgpu::TextureView, u64),
    pub text: (&'a wgpu::TextureView, u64),
    pub trail: (&'a wgpu::TextureView, u64),
}

/// Full-screen triangle combining the offscreen target with the overlay textures.
#[derive(Default)]
pub struct PrimaryPass {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,

    ubo: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,
    bind_group: Option<wgpu::BindGroup>,
    bound_generations: Option<(u64, u64, u64)>,
}

impl PrimaryPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws into `output` (the surface, or the post chain's input).
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        output_format: wgpu::TextureFormat,
        inputs: &PrimaryInputs<'_>,
        uniforms: &PrimaryUniforms,
    ) -> Result<(), FrameError> {
        self.ensure_pipeline(ctx, output_format);
        self.ensure_bindings(ctx, inputs);

        let (Some(pipeline), Some(bind_group), Some(ubo)) =
            (self.pipeline.as_ref(), self.bind_group.as_ref(), self.ubo.as_ref())
        else {
            return Err(FrameError::MissingTarget { pass: PASS });
        };

        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(uniforms));

        let mut rpass = begin_pass(encoder, "projector primary pass", output, wgpu::Color::BLACK);
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.draw(0..3, 0..1);
        Ok(())
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>, format: wgpu::TextureFormat) {
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("projector primary shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/primary.wgsl").into()),
        });

        let layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("projector primary bgl"),
            entries: &[
                uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX_FRAGMENT,
                    binding_size::<PrimaryUniforms>(),
                ),
                sampler_entry(1),
                texture_entry(2),
                texture_entry(3),
                texture_entry(4),
            ],
        });

        let pipeline =
            fullscreen_pipeline(ctx.device, "projector primary pipeline", &shader, &layout, format);

        self.pipeline_format = Some(format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(layout);
        self.bind_group = None;
        self.bound_generations = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>, inputs: &PrimaryInputs<'_>) {
        let generations = (inputs.background.1, inputs.text.1, inputs.trail.1);
        if self.bind_group.is_some() && self.bound_generations == Some(generations) {
            return;
        }
        let Some(layout) = self.bind_group_layout.as_ref() else { return };

        let ubo = self.ubo.get_or_insert_with(|| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("projector primary ubo"),
                size: std::mem::size_of::<PrimaryUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        let sampler = self
            .sampler
            .get_or_insert_with(|| linear_clamp_sampler(ctx.device, "projector primary sampler"));

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("projector primary bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(inputs.background.0),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(inputs.text.0),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(inputs.trail.0),
                },
            ],
        });

        self.bind_group = Some(bind_group);
        self.bound_generations = Some(generations);
    }
}
