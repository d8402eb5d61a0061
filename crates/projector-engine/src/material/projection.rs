use glam::{Mat4, Vec2, Vec3};

use crate::scene::Camera;

/// Size of the projected image inside the camera frustum, in frustum units
/// (`1.0` spans the whole frustum on that axis).
///
/// The image keeps its own aspect ratio ("contain") and is scaled by `scale`.
pub fn footprint(camera_aspect: f32, texture_aspect: f32, scale: f32) -> Vec2 {
    if texture_aspect > camera_aspect {
        Vec2::new(scale, scale * camera_aspect / texture_aspect)
    } else {
        Vec2::new(scale * texture_aspect / camera_aspect, scale)
    }
}

/// Projector state captured by value when an element is projected.
///
/// Nothing in here refers back to the camera or the element: moving either one
/// afterwards leaves the texture glued to the surface.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProjectionBinding {
    view: Mat4,
    proj: Mat4,
    camera_position: Vec3,
    model: Mat4,
    footprint: Vec2,
}

impl ProjectionBinding {
    pub fn capture(camera: &Camera, model: Mat4, texture_aspect: f32, texture_scale: f32) -> Self {
        Self {
            view: camera.view_matrix(),
            proj: camera.projection_matrix(),
            camera_position: camera.position(),
            model,
            footprint: footprint(camera.aspect(), texture_aspect, texture_scale),
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.proj
    }

    pub fn camera_position(&self) -> Vec3 {
        self.camera_position
    }

    /// Model matrix of the element at bind time.
    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    pub fn footprint(&self) -> Vec2 {
        self.footprint
    }

    /// Object space straight to projector clip space.
    pub fn projector_matrix(&self) -> Mat4 {
        self.proj * self.view * self.model
    }

    /// Texture coordinate (origin top-left) of an object-space point, or `None` when
    /// the point is behind the projector or falls outside the image.
    pub fn texture_coord(&self, object_point: Vec3) -> Option<Vec2> {
        let clip = self.projector_matrix() * object_point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }

        let ndc = Vec2::new(clip.x, clip.y) / clip.w;
        let uv = Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
        let uv = (uv - Vec2::splat(0.5)) / self.footprint + Vec2::splat(0.5);

        let inside = (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y);
        inside.then_some(uv)
    }
}
