use glam::{Mat4, Vec2, Vec3};

/// How a camera maps view space to clip space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Projection {
    /// Box frustum `frustum_height` tall; width follows the aspect ratio.
    Orthographic { frustum_height: f32 },
    /// Pinhole frustum with a vertical field of view in radians.
    Perspective { fov_y: f32 },
}

/// A viewpoint with eagerly derived view/projection matrices.
///
/// Every setter recomputes both matrices, so readers never observe stale values.
#[derive(Debug, Clone)]
pub struct Camera {
    projection: Projection,
    aspect: f32,
    near: f32,
    far: f32,

    position: Vec3,
    target: Vec3,
    up: Vec3,

    view: Mat4,
    proj: Mat4,
}

/// Ray in world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Camera {
    pub fn new(projection: Projection, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            projection,
            aspect,
            near,
            far,
            position: Vec3::new(0.0, 0.0, 1.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
        };
        camera.update_matrices();
        camera
    }

    pub fn orthographic(frustum_height: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::new(Projection::Orthographic { frustum_height }, aspect, near, far)
    }

    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::new(Projection::Perspective { fov_y }, aspect, near, far)
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.proj
    }

    pub fn view_projection(&self) -> Mat4 {
        self.proj * self.view
    }

    /// Sets width/height and rebuilds the frustum bounds from it.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_matrices();
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_matrices();
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
        self.update_matrices();
    }

    /// Orthographic bounds as `(left, right, bottom, top)`, or `None` for perspective cameras.
    pub fn frustum_bounds(&self) -> Option<(f32, f32, f32, f32)> {
        match self.projection {
            Projection::Orthographic { frustum_height } => {
                let half_h = frustum_height * 0.5;
                let half_w = half_h * self.aspect;
                Some((-half_w, half_w, -half_h, half_h))
            }
            Projection::Perspective { .. } => None,
        }
    }

    /// Depth of `point` along the viewing direction (larger is farther).
    pub fn view_depth(&self, point: Vec3) -> f32 {
        -(self.view.transform_point3(point).z)
    }

    /// World-space ray through `ndc` (x right, y up, both in `[-1, 1]`).
    pub fn ray_through(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let near = inverse * ndc.extend(0.0).extend(1.0);
        let far = inverse * ndc.extend(1.0).extend(1.0);
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;
        Ray {
            origin: near,
            direction: (far - near).normalize_or_zero(),
        }
    }

    fn update_matrices(&mut self) {
        // Looking straight along `up` degenerates look_at; nudge the up axis instead.
        let forward = (self.target - self.position).normalize_or_zero();
        let up = if forward.cross(self.up).length_squared() < 1e-12 {
            Vec3::Z
        } else {
            self.up
        };

        self.view = Mat4::look_at_rh(self.position, self.target, up);
        self.proj = match self.projection {
            Projection::Orthographic { frustum_height } => {
                let half_h = frustum_height * 0.5;
                let half_w = half_h * self.aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
            Projection::Perspective { fov_y } => {
                Mat4::perspective_rh(fov_y, self.aspect, self.near, self.far)
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orthographic_bounds_follow_aspect() {
        let mut camera = Camera::orthographic(3.0, 2.0, -1000.0, 1000.0);
        assert_eq!(camera.frustum_bounds(), Some((-3.0, 3.0, -1.5, 1.5)));

        camera.set_aspect(0.5);
        assert_eq!(camera.aspect(), 0.5);
        assert_eq!(camera.frustum_bounds(), Some((-0.75, 0.75, -1.5, 1.5)));
    }

    #[test]
    fn matrices_update_when_position_changes() {
        let mut camera = Camera::orthographic(3.0, 1.0, -1000.0, 1000.0);
        let before = camera.view_matrix();
        camera.set_position(Vec3::new(1.0, 0.0, 3.0));
        assert_ne!(before, camera.view_matrix());
    }

    #[test]
    fn frustum_corner_maps_to_clip_corner() {
        let mut camera = Camera::orthographic(2.0, 1.0, -10.0, 10.0);
        camera.set_position(Vec3::new(0.0, 0.0, 3.0));

        let clip = camera.view_projection() * Vec3::new(1.0, 1.0, 0.0).extend(1.0);
        assert!((clip.x / clip.w - 1.0).abs() < 1e-5);
        assert!((clip.y / clip.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ray_through_center_points_at_target() {
        let mut camera = Camera::perspective(1.0, 1.0, 0.1, 100.0);
        camera.set_position(Vec3::new(0.0, 0.0, 5.0));
        let ray = camera.ray_through(Vec2::ZERO);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn view_depth_grows_away_from_camera() {
        let mut camera = Camera::orthographic(3.0, 1.0, -1000.0, 1000.0);
        camera.set_position(Vec3::new(0.0, 0.0, 3.0));
        assert!(camera.view_depth(Vec3::ZERO) > camera.view_depth(Vec3::new(0.0, 0.0, 2.0)));
    }
}
