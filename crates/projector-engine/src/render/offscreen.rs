use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::assets::{TextureId, TextureStore};
use crate::coords::Viewport;
use crate::error::FrameError;
use crate::scene::{CameraRegistry, Geometry, PointLight, Scene, SceneElement};

use super::common::{
    binding_size, linear_clamp_sampler, premul_alpha_blend, primitive_state, sampler_entry,
    texture_entry, uniform_entry,
};
use super::texture::retain_stored;
use super::{OffscreenTarget, RenderCtx, TextureCache};

pub const MAX_LIGHTS: usize = 4;

const PASS: &str = "offscreen";

/// Draws the background scene into its own render target, never into the surface.
///
/// Elements are sorted back to front by view depth and blended with premultiplied
/// alpha. Consecutive elements sharing a texture are drawn with one instanced call.
pub struct OffscreenPass {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    globals_layout: Option<wgpu::BindGroupLayout>,
    texture_layout: Option<wgpu::BindGroupLayout>,

    globals_ubo: Option<wgpu::Buffer>,
    globals_bind_group: Option<wgpu::BindGroup>,
    sampler: Option<wgpu::Sampler>,
    texture_bind_groups: HashMap<TextureId, wgpu::BindGroup>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,
    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,

    target: OffscreenTarget,
    target_size: Viewport,
}

impl OffscreenPass {
    pub fn new(size: Viewport) -> Self {
        Self {
            pipeline_format: None,
            pipeline: None,
            globals_layout: None,
            texture_layout: None,
            globals_ubo: None,
            globals_bind_group: None,
            sampler: None,
            texture_bind_groups: HashMap::new(),
            quad_vbo: None,
            quad_ibo: None,
            instance_vbo: None,
            instance_capacity: 0,
            target: OffscreenTarget::new("projector offscreen target"),
            target_size: size,
        }
    }

    /// Sets the size the target is realised at on the next render.
    pub fn resize(&mut self, size: Viewport) {
        self.target_size = size;
    }

    pub fn target(&self) -> &OffscreenTarget {
        &self.target
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        scene: &Scene,
        cameras: &CameraRegistry,
        store: &TextureStore,
        textures: &mut TextureCache,
    ) -> Result<(), FrameError> {
        let camera = cameras
            .get(scene.camera())
            .ok_or(FrameError::MissingCamera { pass: PASS })?;

        retain_stored(&mut self.texture_bind_groups, store);
        self.ensure_pipeline(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_globals(ctx);
        self.target.ensure(ctx.device, self.target_size, ctx.surface_format);

        // Back to front.
        let mut elements: Vec<&SceneElement> = scene.iter().map(|(_, e)| e).collect();
        elements.sort_by(|a, b| {
            let da = camera.view_depth(a.transform.position);
            let db = camera.view_depth(b.transform.position);
            db.total_cmp(&da)
        });

        let mut instances = Vec::with_capacity(elements.len());
        let mut batches: Vec<(TextureId, u32, u32)> = Vec::new();
        for element in elements {
            let texture = element.material.texture();
            self.ensure_texture_bind_group(ctx, store, textures, texture)?;

            let index = instances.len() as u32;
            instances.push(ElementInstance::from_element(element));
            match batches.last_mut() {
                Some((id, _, end)) if *id == texture => *end = index + 1,
                _ => batches.push((texture, index, index + 1)),
            }
        }

        self.write_globals(ctx, camera.view_projection(), scene.lights());
        if !instances.is_empty() {
            self.ensure_instance_capacity(ctx, instances.len());
            if let Some(vbo) = self.instance_vbo.as_ref() {
                ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&instances));
            }
        }

        let Some(view) = self.target.view() else {
            return Err(FrameError::MissingTarget { pass: PASS });
        };
        let mut rpass = super::common::begin_pass(
            encoder,
            "projector offscreen pass",
            view,
            scene.clear_color.to_wgpu(),
        );

        if instances.is_empty() {
            return Ok(());
        }

        let (Some(pipeline), Some(globals), Some(quad_vbo), Some(quad_ibo), Some(instance_vbo)) = (
            self.pipeline.as_ref(),
            self.globals_bind_group.as_ref(),
            self.quad_vbo.as_ref(),
            self.quad_ibo.as_ref(),
            self.instance_vbo.as_ref(),
        ) else {
            return Ok(());
        };

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, globals, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);

        for (texture, start, end) in batches {
            let Some(bind_group) = self.texture_bind_groups.get(&texture) else {
                continue;
            };
            rpass.set_bind_group(1, bind_group, &[]);
            rpass.draw_indexed(0..6, 0, start..end);
        }
        Ok(())
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("projector offscreen shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/offscreen.wgsl").into()),
        });

        let globals_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("projector offscreen globals bgl"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                binding_size::<SceneGlobals>(),
            )],
        });
        let texture_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("projector offscreen texture bgl"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("projector offscreen pipeline layout"),
            bind_group_layouts: &[&globals_layout, &texture_layout],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("projector offscreen pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[PlaneVertex::layout(), ElementInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: primitive_state(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.globals_layout = Some(globals_layout);
        self.texture_layout = Some(texture_layout);

        self.globals_ubo = None;
        self.globals_bind_group = None;
        self.texture_bind_groups.clear();
    }

    fn ensure_globals(&mut self, ctx: &RenderCtx<'_>) {
        if self.globals_bind_group.is_some() && self.globals_ubo.is_some() {
            return;
        }
        let Some(layout) = self.globals_layout.as_ref() else { return };

        let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("projector offscreen globals ubo"),
            size: std::mem::size_of::<SceneGlobals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("projector offscreen globals bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        self.globals_ubo = Some(ubo);
        self.globals_bind_group = Some(bind_group);
    }

    fn ensure_texture_bind_group(
        &mut self,
        ctx: &RenderCtx<'_>,
        store: &TextureStore,
        textures: &mut TextureCache,
        id: TextureId,
    ) -> Result<(), FrameError> {
        if self.texture_bind_groups.contains_key(&id) {
            return Ok(());
        }
        let missing = FrameError::MissingTexture { pass: PASS, texture: id };
        let Some(layout) = self.texture_layout.as_ref() else {
            return Err(missing);
        };
        let sampler = self
            .sampler
            .get_or_insert_with(|| linear_clamp_sampler(ctx.device, "projector slide sampler"));
        let gpu = textures.ensure(ctx, store, id).ok_or(missing)?;

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("projector slide bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&gpu.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        self.texture_bind_groups.insert(id, bind_group);
        Ok(())
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("projector plane vbo"),
            contents: bytemuck::cast_slice(&PLANE_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("projector plane ibo"),
            contents: bytemuck::cast_slice(&PLANE_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    fn write_globals(&self, ctx: &RenderCtx<'_>, view_proj: Mat4, lights: &[PointLight]) {
        let Some(ubo) = self.globals_ubo.as_ref() else { return };
        if lights.len() > MAX_LIGHTS {
            log::debug!("offscreen pass: {} lights, only {MAX_LIGHTS} are used", lights.len());
        }
        let globals = SceneGlobals::new(view_proj, lights);
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&globals));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }

        let new_cap = required.next_power_of_two().max(64);
        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("projector element instance vbo"),
            size: (new_cap * std::mem::size_of::<ElementInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct LightUniform {
    position: [f32; 4],
    color: [f32; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SceneGlobals {
    view_proj: [[f32; 4]; 4],
    light_count: [u32; 4],
    lights: [LightUniform; MAX_LIGHTS],
}

impl SceneGlobals {
    fn new(view_proj: Mat4, lights: &[PointLight]) -> Self {
        let mut globals = Self {
            view_proj: view_proj.to_cols_array_2d(),
            light_count: [lights.len().min(MAX_LIGHTS) as u32, 0, 0, 0],
            lights: [LightUniform::zeroed(); MAX_LIGHTS],
        };
        for (slot, light) in globals.lights.iter_mut().zip(lights) {
            *slot = LightUniform {
                position: light.position.extend(light.intensity).to_array(),
                color: [light.color.r, light.color.g, light.color.b, light.distance],
                params: [light.decay, 0.0, 0.0, 0.0],
            };
        }
        globals
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct PlaneVertex {
    position: [f32; 3],
}

impl PlaneVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PlaneVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

// Unit plane; instances scale it to their geometry.
const PLANE_VERTICES: [PlaneVertex; 4] = [
    PlaneVertex { position: [-0.5, -0.5, 0.0] },
    PlaneVertex { position: [0.5, -0.5, 0.0] },
    PlaneVertex { position: [0.5, 0.5, 0.0] },
    PlaneVertex { position: [-0.5, 0.5, 0.0] },
];

const PLANE_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct ElementInstance {
    model: [[f32; 4]; 4],
    projector: [[f32; 4]; 4],
    tint: [f32; 4],
    params: [f32; 4],
}

impl ElementInstance {
    const ATTRS: [wgpu::VertexAttribute; 10] = wgpu::vertex_attr_array![
        1 => Float32x4, 2 => Float32x4, 3 => Float32x4, 4 => Float32x4, // model
        5 => Float32x4, 6 => Float32x4, 7 => Float32x4, 8 => Float32x4, // projector
        9 => Float32x4,  // tint
        10 => Float32x4  // footprint, transparent, bound
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ElementInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }

    fn from_element(element: &SceneElement) -> Self {
        let size = match element.geometry {
            Geometry::Plane { width, height } => Mat4::from_scale(Vec3::new(width, height, 1.0)),
        };
        let uniforms = element.material.uniforms();
        let projector = Mat4::from_cols_array_2d(&uniforms.projector);

        Self {
            model: (element.transform.matrix() * size).to_cols_array_2d(),
            projector: (projector * size).to_cols_array_2d(),
            tint: uniforms.tint,
            params: uniforms.params,
        }
    }
}
