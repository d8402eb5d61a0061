use glam::{Vec2, Vec3};

use crate::material::ProjectedMaterial;

use super::{ElementAnimation, Transform};

/// Renderable surface shape, in object space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Geometry {
    /// Rectangle in the XY plane, centered on the origin, facing +Z.
    Plane { width: f32, height: f32 },
}

impl Geometry {
    pub fn plane(width: f32, height: f32) -> Self {
        Geometry::Plane { width, height }
    }

    pub fn normal(&self) -> Vec3 {
        match self {
            Geometry::Plane { .. } => Vec3::Z,
        }
    }

    /// Corners in counter-clockwise order starting bottom-left.
    pub fn corners(&self) -> [Vec3; 4] {
        match *self {
            Geometry::Plane { width, height } => {
                let (hw, hh) = (width * 0.5, height * 0.5);
                [
                    Vec3::new(-hw, -hh, 0.0),
                    Vec3::new(hw, -hh, 0.0),
                    Vec3::new(hw, hh, 0.0),
                    Vec3::new(-hw, hh, 0.0),
                ]
            }
        }
    }

    /// Whether an in-plane object-space point lies on the surface.
    pub fn contains(&self, point: Vec2) -> bool {
        match *self {
            Geometry::Plane { width, height } => {
                point.x.abs() <= width * 0.5 && point.y.abs() <= height * 0.5
            }
        }
    }
}

/// Geometry + projected material + transform, optionally animated.
#[derive(Debug, Clone)]
pub struct SceneElement {
    pub geometry: Geometry,
    pub material: ProjectedMaterial,
    pub transform: Transform,
    pub animation: Option<ElementAnimation>,
}

impl SceneElement {
    pub fn new(geometry: Geometry, material: ProjectedMaterial, transform: Transform) -> Self {
        Self {
            geometry,
            material,
            transform,
            animation: None,
        }
    }

    /// Steps the animation and writes its values into the transform and material.
    pub fn advance(&mut self, dt: f32) {
        if let Some(animation) = self.animation.as_mut() {
            let (x, opacity) = animation.advance(dt);
            self.transform.position.x = x;
            self.material.set_opacity(opacity);
        }
    }
}
