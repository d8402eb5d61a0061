use glam::Vec3;
use rand::rngs::StdRng;
use rand::Rng;

use crate::assets::{TextureId, TextureStore};
use crate::coords::Viewport;
use crate::material::{project, ProjectedMaterial, ProjectedMaterialDesc};
use crate::overlay::{DynamicTexture, MouseTrail, TextCanvas, TrailConfig};
use crate::params::PrimaryParams;
use crate::render::PrimaryUniforms;
use crate::scene::{
    Camera, CameraId, CameraRegistry, ElementAnimation, Geometry, PointLight, Scene, SceneElement,
    Transform,
};

use super::StageConfig;

/// Everything a [`FrameRenderer`](super::FrameRenderer) reads to draw a frame.
pub struct Stage {
    pub cameras: CameraRegistry,
    pub background_camera: CameraId,
    pub foreground_camera: CameraId,
    pub background: Scene,
    pub textures: TextureStore,

    pub text: TextCanvas,
    pub trail: MouseTrail,

    pub primary: PrimaryUniforms,
    /// Logical size of the offscreen target (and every other output-sized resource).
    pub target_size: Viewport,

    pub shader_time: f32,
}

impl Stage {
    /// Cameras and scenes, then lights, then targets and overlays. No materials yet.
    pub(super) fn build(
        config: &StageConfig,
        size: Viewport,
        params: PrimaryParams,
        font: Option<fontdue::Font>,
    ) -> Self {
        let aspect = size.aspect();

        let mut cameras = CameraRegistry::new();
        let mut background_camera = Camera::orthographic(
            config.frustum_height,
            aspect,
            config.camera_near,
            config.camera_far,
        );
        background_camera.set_position(Vec3::new(0.0, 0.0, config.camera_distance));
        let background_camera = cameras.insert(background_camera);

        // Frames the primary pass: a 2-unit-tall frustum around the z = 0 plane.
        let mut foreground_camera = Camera::orthographic(2.0, aspect, 0.0, 2.0);
        foreground_camera.set_position(Vec3::new(0.0, 0.0, 1.0));
        let mut primary = PrimaryUniforms::new(size, params);
        primary.set_camera(&foreground_camera);
        let foreground_camera = cameras.insert(foreground_camera);

        let mut background = Scene::new(background_camera);
        background.add_light(PointLight::new(
            config.light_position,
            config.light_intensity,
            config.light_distance,
        ));

        Self {
            cameras,
            background_camera,
            foreground_camera,
            background,
            textures: TextureStore::new(),
            text: TextCanvas::new(size, font, config.overlay_text.clone()),
            trail: MouseTrail::new(size, TrailConfig::default()),
            primary,
            target_size: size,
            shader_time: 0.0,
        }
    }

    /// Applies a new output size to everything the stage owns, in one step.
    pub(super) fn resize(&mut self, size: Viewport) {
        let aspect = size.aspect();
        for id in [self.background_camera, self.foreground_camera] {
            if let Some(camera) = self.cameras.get_mut(id) {
                camera.set_aspect(aspect);
            }
        }
        if let Some(camera) = self.cameras.get(self.foreground_camera) {
            self.primary.set_camera(camera);
        }
        self.target_size = size;
        self.primary.set_resolution(size);
        self.text.resize(size);
        self.trail.resize(size);
    }

    /// Creates and projects the backdrop and the animated elements for `texture`.
    ///
    /// Elements that fail configuration are logged and skipped. Returns how many were added.
    pub(super) fn populate(&mut self, config: &StageConfig, texture: TextureId, rng: &mut StdRng) -> usize {
        let desc = ProjectedMaterialDesc {
            camera: Some(self.background_camera),
            texture: Some(texture),
            color: config.color,
            texture_scale: config.texture_scale,
            transparent: config.transparent,
        };

        let mut added = 0;
        if config.backdrop_size > 0.0 {
            let backdrop = Geometry::plane(config.backdrop_size, config.backdrop_size);
            if self.add_projected(desc, backdrop, Transform::IDENTITY, None) {
                added += 1;
            }
        }

        let (lo, hi) = config.element_bounds;
        let (dur_lo, dur_hi) = config.tween_duration;
        let geometry = Geometry::plane(config.element_size, config.element_size);
        for _ in 0..config.element_count {
            let position = Vec3::new(
                rng.gen_range(lo.x..=hi.x),
                rng.gen_range(lo.y..=hi.y),
                rng.gen_range(lo.z..=hi.z),
            );
            let transform = Transform::from_position(position).with_uniform_scale(config.element_scale);

            let duration = rng.gen_range(dur_lo..=dur_hi);
            let offset = rng.gen_range(-config.tween_offset..=config.tween_offset);
            let animation =
                ElementAnimation::drift_and_fade(position.x, offset, config.color.a, duration);

            if self.add_projected(desc, geometry, transform, Some(animation)) {
                added += 1;
            }
        }
        added
    }

    fn add_projected(
        &mut self,
        desc: ProjectedMaterialDesc,
        geometry: Geometry,
        transform: Transform,
        animation: Option<ElementAnimation>,
    ) -> bool {
        let material = match ProjectedMaterial::new(desc, &self.cameras, &self.textures) {
            Ok(material) => material,
            Err(e) => {
                log::warn!("skipping element: {e}");
                return false;
            }
        };

        let mut element = SceneElement::new(geometry, material, transform);
        element.animation = animation;
        if let Err(e) = project(&mut element, &self.cameras, &self.textures) {
            log::warn!("skipping element: {e}");
            return false;
        }
        self.background.add(element);
        true
    }

    /// Advances every element animation by `dt` seconds.
    pub(super) fn animate(&mut self, dt: f32) {
        for element in self.background.values_mut() {
            element.advance(dt);
        }
    }
}
