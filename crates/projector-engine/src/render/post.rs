use bytemuck::{Pod, Zeroable};

use crate::coords::Viewport;
use crate::error::FrameError;

use super::common::{
    begin_pass, binding_size, fullscreen_pipeline, linear_clamp_sampler, sampler_entry,
    texture_entry, uniform_entry,
};
use super::{OffscreenTarget, RenderCtx};

/// One full-screen stage of the post chain.
pub trait PostEffect {
    fn label(&self) -> &'static str;

    fn resize(&mut self, _size: Viewport) {}

    fn update(&mut self, _time: f32) {}

    /// Reads `input` and writes the whole of `output`.
    fn encode(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
        output_format: wgpu::TextureFormat,
    ) -> Result<(), FrameError>;
}

/// Where a stage reads from or writes to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Slot {
    Ping(usize),
    Surface,
}

/// `(input, output)` for each of `stages` stages. The primary pass writes `Ping(0)`.
pub fn routing(stages: usize) -> Vec<(Slot, Slot)> {
    (0..stages)
        .map(|i| {
            let input = Slot::Ping(i % 2);
            let output = if i + 1 == stages {
                Slot::Surface
            } else {
                Slot::Ping((i + 1) % 2)
            };
            (input, output)
        })
        .collect()
}

fn slot_view<'a>(
    slot: Slot,
    ping: &'a [OffscreenTarget; 2],
    surface: &'a wgpu::TextureView,
) -> Result<&'a wgpu::TextureView, FrameError> {
    match slot {
        Slot::Surface => Ok(surface),
        Slot::Ping(i) => ping[i % 2]
            .view()
            .ok_or(FrameError::MissingTarget { pass: "post" }),
    }
}

/// Ordered, possibly empty list of [`PostEffect`]s sharing two ping-pong targets.
pub struct PostChain {
    effects: Vec<Box<dyn PostEffect>>,
    ping: [OffscreenTarget; 2],
    size: Viewport,
}

impl PostChain {
    pub fn new(size: Viewport) -> Self {
        Self {
            effects: Vec::new(),
            ping: [
                OffscreenTarget::new("projector post ping"),
                OffscreenTarget::new("projector post pong"),
            ],
            size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.effects.iter().map(|e| e.label())
    }

    /// Appends a stage; earlier stages are untouched.
    pub fn push(&mut self, mut effect: Box<dyn PostEffect>) {
        effect.resize(self.size);
        log::info!("post chain: added {}", effect.label());
        self.effects.push(effect);
    }

    pub fn insert(&mut self, index: usize, mut effect: Box<dyn PostEffect>) {
        effect.resize(self.size);
        let index = index.min(self.effects.len());
        self.effects.insert(index, effect);
    }

    pub fn remove(&mut self, index: usize) -> Option<Box<dyn PostEffect>> {
        (index < self.effects.len()).then(|| self.effects.remove(index))
    }

    pub fn resize(&mut self, size: Viewport) {
        self.size = size;
        for effect in &mut self.effects {
            effect.resize(size);
        }
    }

    pub fn update(&mut self, time: f32) {
        for effect in &mut self.effects {
            effect.update(time);
        }
    }

    /// Target the primary pass renders into when the chain is non-empty.
    pub fn input_view(&mut self, ctx: &RenderCtx<'_>) -> Option<&wgpu::TextureView> {
        self.ping[0].ensure(ctx.device, self.size, ctx.surface_format);
        self.ping[0].view()
    }

    /// Runs every stage; the last one writes `surface`.
    pub fn run(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        surface: &wgpu::TextureView,
    ) -> Result<(), FrameError> {
        for target in &mut self.ping {
            target.ensure(ctx.device, self.size, ctx.surface_format);
        }

        let stages = routing(self.effects.len());
        for (effect, (input, output)) in self.effects.iter_mut().zip(stages) {
            let input = slot_view(input, &self.ping, surface)?;
            let output = slot_view(output, &self.ping, surface)?;
            effect.encode(ctx, encoder, input, output, ctx.surface_format)?;
        }
        Ok(())
    }
}

/// Noise grain with scanlines, optionally grayscale.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FilmSettings {
    pub noise_intensity: f32,
    pub scanline_intensity: f32,
    pub scanline_count: f32,
    pub grayscale: bool,
}

impl Default for FilmSettings {
    fn default() -> Self {
        Self {
            noise_intensity: 0.35,
            scanline_intensity: 0.025,
            scanline_count: 648.0,
            grayscale: false,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct FilmUniforms {
    time: f32,
    noise_intensity: f32,
    scanline_intensity: f32,
    scanline_count: f32,
    grayscale: f32,
    _pad: [f32; 3],
}

#[derive(Default)]
pub struct FilmEffect {
    pub settings: FilmSettings,
    time: f32,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    ubo: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,
}

impl FilmEffect {
    pub fn new(settings: FilmSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>, format: wgpu::TextureFormat) {
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("projector film shader"),
            source: wgpu::ShaderSource::Wgsl(
                concat!(
                    include_str!("shaders/fullscreen.wgsl"),
                    include_str!("shaders/film.wgsl")
                )
                .into(),
            ),
        });
        let layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("projector film bgl"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT, binding_size::<FilmUniforms>()),
                sampler_entry(1),
                texture_entry(2),
            ],
        });

        self.pipeline = Some(fullscreen_pipeline(
            ctx.device,
            "projector film pipeline",
            &shader,
            &layout,
            format,
        ));
        self.pipeline_format = Some(format);
        self.bind_group_layout = Some(layout);
    }
}

impl PostEffect for FilmEffect {
    fn label(&self) -> &'static str {
        "film"
    }

    fn update(&mut self, time: f32) {
        self.time = time;
    }

    fn encode(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
        output_format: wgpu::TextureFormat,
    ) -> Result<(), FrameError> {
        self.ensure_pipeline(ctx, output_format);

        let ubo = self.ubo.get_or_insert_with(|| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("projector film ubo"),
                size: std::mem::size_of::<FilmUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        let sampler = self
            .sampler
            .get_or_insert_with(|| linear_clamp_sampler(ctx.device, "projector film sampler"));

        let uniforms = FilmUniforms {
            time: self.time,
            noise_intensity: self.settings.noise_intensity,
            scanline_intensity: self.settings.scanline_intensity,
            scanline_count: self.settings.scanline_count,
            grayscale: if self.settings.grayscale { 1.0 } else { 0.0 },
            _pad: [0.0; 3],
        };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&uniforms));

        let (Some(pipeline), Some(layout)) = (self.pipeline.as_ref(), self.bind_group_layout.as_ref())
        else {
            return Err(FrameError::MissingTarget { pass: "film" });
        };

        // Rebuilt per encode: the input alternates between ping-pong targets.
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("projector film bind group"),
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
                    resource: wgpu::BindingResource::TextureView(input),
                },
            ],
        });

        let mut rpass = begin_pass(encoder, "projector film pass", output, wgpu::Color::BLACK);
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.draw(0..3, 0..1);
        Ok(())
    }
}
