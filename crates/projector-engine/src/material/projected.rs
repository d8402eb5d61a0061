use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::assets::{TextureId, TextureStore};
use crate::error::ConfigurationError;
use crate::paint::Color;
use crate::scene::{Camera, CameraId, CameraRegistry};

use super::ProjectionBinding;

/// Parameters a projected material is built from.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProjectedMaterialDesc {
    pub camera: Option<CameraId>,
    pub texture: Option<TextureId>,
    pub color: Color,
    pub texture_scale: f32,
    pub transparent: bool,
}

impl Default for ProjectedMaterialDesc {
    fn default() -> Self {
        Self {
            camera: None,
            texture: None,
            color: Color::WHITE,
            texture_scale: 1.0,
            transparent: false,
        }
    }
}

/// Per-instance values consumed by the offscreen shader.
///
/// `params` packs `(footprint.x, footprint.y, transparent, bound)`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ProjectedUniforms {
    pub projector: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub tint: [f32; 4],
    pub params: [f32; 4],
}

/// Surface material that looks up its color as if a slide were projected onto it.
#[derive(Debug, Clone)]
pub struct ProjectedMaterial {
    camera: CameraId,
    texture: TextureId,
    color: Color,
    texture_scale: f32,
    transparent: bool,
    opacity: f32,

    binding: Option<ProjectionBinding>,
    uniforms: ProjectedUniforms,
}

impl ProjectedMaterial {
    /// Validates `desc` against the live registries.
    pub fn new(
        desc: ProjectedMaterialDesc,
        cameras: &CameraRegistry,
        textures: &TextureStore,
    ) -> Result<Self, ConfigurationError> {
        let camera = desc.camera.ok_or(ConfigurationError::MissingCamera)?;
        let texture = desc.texture.ok_or(ConfigurationError::MissingTexture)?;

        if !cameras.contains(camera) {
            return Err(ConfigurationError::UnknownCamera(camera));
        }
        if !textures.contains(texture) {
            return Err(ConfigurationError::UnknownTexture(texture));
        }
        if !desc.texture_scale.is_finite() || desc.texture_scale <= 0.0 {
            return Err(ConfigurationError::InvalidTextureScale(desc.texture_scale));
        }

        let mut material = Self {
            camera,
            texture,
            color: desc.color,
            texture_scale: desc.texture_scale,
            transparent: desc.transparent,
            opacity: desc.color.a,
            binding: None,
            uniforms: ProjectedUniforms::zeroed(),
        };
        material.refresh_uniforms();
        Ok(material)
    }

    pub fn camera(&self) -> CameraId {
        self.camera
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn texture_scale(&self) -> f32 {
        self.texture_scale
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity != self.opacity {
            self.opacity = opacity;
            self.refresh_uniforms();
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn binding(&self) -> Option<&ProjectionBinding> {
        self.binding.as_ref()
    }

    pub fn uniforms(&self) -> &ProjectedUniforms {
        &self.uniforms
    }

    /// Captures the projector from `camera` and the element's current `model` matrix.
    pub fn bind(&mut self, camera: &Camera, model: Mat4, texture_aspect: f32) {
        self.binding = Some(ProjectionBinding::capture(
            camera,
            model,
            texture_aspect,
            self.texture_scale,
        ));
        self.refresh_uniforms();
    }

    /// Straight-alpha color at `object_point`, or `None` when the fragment is discarded.
    ///
    /// `sample` receives a texture coordinate in `[0, 1]²` and returns a linear texel.
    pub fn shade(&self, object_point: Vec3, sample: impl Fn(glam::Vec2) -> Color) -> Option<Color> {
        let tint = self.color;
        let coord = self.binding.and_then(|b| b.texture_coord(object_point));

        match coord {
            Some(uv) => {
                let texel = sample(uv);
                let mix = |a: f32, b: f32| a + (b - a) * texel.a;
                Some(Color::new(
                    mix(tint.r, texel.r),
                    mix(tint.g, texel.g),
                    mix(tint.b, texel.b),
                    self.opacity,
                ))
            }
            None if self.transparent => None,
            None => Some(tint.with_alpha(self.opacity)),
        }
    }

    fn refresh_uniforms(&mut self) {
        let (projector, camera_position, footprint, bound) = match &self.binding {
            Some(b) => (b.projector_matrix(), b.camera_position(), b.footprint(), 1.0),
            None => (Mat4::IDENTITY, Vec3::ZERO, glam::Vec2::ONE, 0.0),
        };

        self.uniforms = ProjectedUniforms {
            projector: projector.to_cols_array_2d(),
            camera_position: camera_position.extend(1.0).to_array(),
            tint: self.color.with_alpha(self.opacity).to_array(),
            params: [
                footprint.x,
                footprint.y,
                if self.transparent { 1.0 } else { 0.0 },
                bound,
            ],
        };
    }
}
