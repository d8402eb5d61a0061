use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use super::{Camera, Projection};

/// Keeps the polar angle off the poles, where `look_at` loses its up axis.
const POLAR_EPSILON: f32 = 1e-3;

/// Pointer-driven orbit and zoom around a fixed target.
///
/// Input is accumulated as it arrives and folded into the camera by [`apply`](Self::apply)
/// between frames. Orthographic cameras zoom by shrinking the frustum, perspective
/// cameras by moving closer.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    target: Vec3,
    distance: f32,
    azimuth: f32,
    polar: f32,

    zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
    base_projection: Projection,

    /// Radians per normalized pointer unit (a full-width drag is two units).
    rotate_speed: f32,
    /// Zoom factor per scroll line.
    zoom_step: f32,

    dragging: bool,
    last_pointer: Option<Vec2>,
    pending_rotate: Vec2,
    pending_scroll: f32,
}

impl OrbitControls {
    /// Starts from the camera's current placement around its look-at target.
    pub fn from_camera(camera: &Camera) -> Self {
        let target = camera.target();
        let offset = camera.position() - target;
        let distance = offset.length().max(1e-4);
        let polar = (offset.y / distance).clamp(-1.0, 1.0).acos();
        let azimuth = offset.x.atan2(offset.z);

        Self {
            target,
            distance,
            azimuth,
            polar: polar.clamp(POLAR_EPSILON, PI - POLAR_EPSILON),
            zoom: 1.0,
            min_zoom: 0.25,
            max_zoom: 8.0,
            base_projection: camera.projection(),
            rotate_speed: PI * 0.5,
            zoom_step: 1.1,
            dragging: false,
            last_pointer: None,
            pending_rotate: Vec2::ZERO,
            pending_scroll: 0.0,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    /// Feeds a normalized pointer position. Only motion while dragging rotates.
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        let pointer = Vec2::new(x, y);
        if self.dragging {
            if let Some(last) = self.last_pointer {
                self.pending_rotate += pointer - last;
            }
        }
        self.last_pointer = Some(pointer);
    }

    /// Positive lines zoom in.
    pub fn scroll(&mut self, lines: f32) {
        self.pending_scroll += lines;
    }

    /// Folds pending input into `camera`. Returns whether the camera moved.
    pub fn apply(&mut self, camera: &mut Camera) -> bool {
        if self.pending_rotate == Vec2::ZERO && self.pending_scroll == 0.0 {
            return false;
        }

        // Pointer y grows downward: dragging down tilts the camera over the top.
        self.azimuth -= self.pending_rotate.x * self.rotate_speed;
        self.polar = (self.polar - self.pending_rotate.y * self.rotate_speed)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.zoom = (self.zoom * self.zoom_step.powf(self.pending_scroll))
            .clamp(self.min_zoom, self.max_zoom);
        self.pending_rotate = Vec2::ZERO;
        self.pending_scroll = 0.0;

        let (distance, projection) = match self.base_projection {
            Projection::Orthographic { frustum_height } => (
                self.distance,
                Projection::Orthographic {
                    frustum_height: frustum_height / self.zoom,
                },
            ),
            perspective @ Projection::Perspective { .. } => (self.distance / self.zoom, perspective),
        };

        let direction = Vec3::new(
            self.polar.sin() * self.azimuth.sin(),
            self.polar.cos(),
            self.polar.sin() * self.azimuth.cos(),
        );
        camera.set_projection(projection);
        camera.set_position(self.target + direction * distance);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        let mut camera = Camera::orthographic(3.0, 1.0, -1000.0, 1000.0);
        camera.set_position(Vec3::new(0.0, 0.0, 3.0));
        camera
    }

    fn frustum_height(camera: &Camera) -> f32 {
        match camera.projection() {
            Projection::Orthographic { frustum_height } => frustum_height,
            Projection::Perspective { .. } => panic!("expected orthographic"),
        }
    }

    #[test]
    fn no_input_leaves_camera_alone() {
        let mut camera = camera();
        let mut controls = OrbitControls::from_camera(&camera);
        controls.pointer_moved(0.3, 0.3);
        assert!(!controls.apply(&mut camera));
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn hover_without_drag_does_not_rotate() {
        let mut camera = camera();
        let mut controls = OrbitControls::from_camera(&camera);
        controls.pointer_moved(0.0, 0.0);
        controls.pointer_moved(0.5, 0.0);
        assert!(!controls.apply(&mut camera));
    }

    #[test]
    fn drag_orbits_at_constant_distance() {
        let mut camera = camera();
        let mut controls = OrbitControls::from_camera(&camera);

        controls.pointer_moved(0.0, 0.0);
        controls.set_dragging(true);
        controls.pointer_moved(0.5, -0.2);
        assert!(controls.apply(&mut camera));

        let position = camera.position();
        assert!((position.length() - 3.0).abs() < 1e-4);
        assert!(position.x < 0.0, "dragging right swings the camera left: {position}");
        assert!(position.y < 0.0, "dragging up tilts the camera under: {position}");
        assert_eq!(camera.target(), Vec3::ZERO);
    }

    #[test]
    fn polar_angle_stops_short_of_the_pole() {
        let mut camera = camera();
        let mut controls = OrbitControls::from_camera(&camera);

        controls.pointer_moved(0.0, -1.0);
        controls.set_dragging(true);
        controls.pointer_moved(0.0, 1.0);
        controls.pointer_moved(0.0, -1.0);
        controls.pointer_moved(0.0, 1.0);
        controls.apply(&mut camera);

        let direction = camera.position().normalize();
        assert!(direction.y < 1.0);
        assert!(camera.view_matrix().is_finite());
    }

    #[test]
    fn scroll_shrinks_orthographic_frustum_within_limits() {
        let mut camera = camera();
        let mut controls = OrbitControls::from_camera(&camera);

        controls.scroll(1.0);
        controls.apply(&mut camera);
        assert!((frustum_height(&camera) - 3.0 / 1.1).abs() < 1e-5);

        controls.scroll(1000.0);
        controls.apply(&mut camera);
        assert_eq!(controls.zoom(), 8.0);
        assert!((frustum_height(&camera) - 3.0 / 8.0).abs() < 1e-5);
    }

    #[test]
    fn scroll_moves_perspective_camera_closer() {
        let mut camera = Camera::perspective(1.0, 1.0, 0.1, 100.0);
        camera.set_position(Vec3::new(0.0, 0.0, 4.0));
        let mut controls = OrbitControls::from_camera(&camera);

        controls.scroll(-1.0);
        controls.apply(&mut camera);
        assert!(camera.position().length() > 4.0);
        assert_eq!(camera.projection(), Projection::Perspective { fov_y: 1.0 });
    }
}
