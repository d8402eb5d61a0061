use std::path::PathBuf;
use std::time::Duration;

use glam::Vec3;

use crate::paint::Color;
use crate::resize::DEFAULT_DEBOUNCE;

/// Everything the orchestrator builds the stage from.
#[derive(Debug, Clone)]
pub struct StageConfig {
    /// Number of animated elements spawned once the slide has loaded.
    pub element_count: usize,
    /// Seed for element placement; `None` draws from entropy.
    pub seed: Option<u64>,

    /// Height of the background camera's orthographic frustum.
    pub frustum_height: f32,
    pub camera_distance: f32,
    pub camera_near: f32,
    pub camera_far: f32,

    pub resize_debounce: Duration,

    pub texture_path: PathBuf,
    pub color: Color,
    pub texture_scale: f32,
    pub transparent: bool,

    pub element_size: f32,
    pub element_scale: f32,
    /// Placement box for elements as `(min, max)` corners.
    pub element_bounds: (Vec3, Vec3),
    /// Range of tween durations in seconds.
    pub tween_duration: (f32, f32),
    /// Maximum horizontal drift per tween cycle.
    pub tween_offset: f32,

    /// Side of the static backdrop plane; `0` disables it.
    pub backdrop_size: f32,

    pub light_position: Vec3,
    pub light_intensity: f32,
    pub light_distance: f32,

    pub overlay_text: String,

    /// Pointer drag orbits the background camera and the wheel zooms it.
    pub orbit_controls: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            element_count: 50,
            seed: None,
            frustum_height: 3.0,
            camera_distance: 3.0,
            camera_near: -1000.0,
            camera_far: 1000.0,
            resize_debounce: DEFAULT_DEBOUNCE,
            texture_path: PathBuf::from("dog.jpg"),
            color: Color::from_srgb_u8(0x31, 0x49, 0xD5, 0xFF),
            texture_scale: 0.8,
            transparent: true,
            element_size: 0.3,
            element_scale: 1.4,
            element_bounds: (Vec3::new(-1.0, -2.0, 1.0), Vec3::new(1.0, 2.0, 2.0)),
            tween_duration: (1.0, 4.0),
            tween_offset: 1.0,
            backdrop_size: 3.0,
            light_position: Vec3::new(0.0, 0.0, 50.0),
            light_intensity: 3.0,
            light_distance: 100.0,
            overlay_text: "PROJECTOR".to_string(),
            orbit_controls: true,
        }
    }
}
