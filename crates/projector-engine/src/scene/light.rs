use glam::Vec3;

use crate::paint::Color;

/// Omnidirectional light with a finite range.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
    /// Range after which the contribution reaches zero. `0` means unlimited.
    pub distance: f32,
    pub decay: f32,
}

impl PointLight {
    pub fn new(position: Vec3, intensity: f32, distance: f32) -> Self {
        Self {
            position,
            color: Color::WHITE,
            intensity,
            distance,
            decay: 1.0,
        }
    }

    /// Distance falloff factor in `[0, 1]`.
    pub fn attenuation(&self, distance: f32) -> f32 {
        if self.distance <= 0.0 {
            return 1.0;
        }
        (1.0 - distance / self.distance).clamp(0.0, 1.0).powf(self.decay)
    }

    /// Lambert irradiance scale at `point` with unit `normal`.
    pub fn irradiance(&self, point: Vec3, normal: Vec3) -> f32 {
        let to_light = self.position - point;
        let distance = to_light.length();
        if distance <= f32::EPSILON {
            return self.intensity;
        }
        let lambert = normal.dot(to_light / distance).max(0.0);
        lambert * self.attenuation(distance) * self.intensity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_surface_is_lit() {
        let light = PointLight::new(Vec3::new(0.0, 0.0, 50.0), 3.0, 100.0);
        let lit = light.irradiance(Vec3::ZERO, Vec3::Z);
        assert!((lit - 1.5).abs() < 1e-5);
    }

    #[test]
    fn back_facing_surface_is_dark() {
        let light = PointLight::new(Vec3::new(0.0, 0.0, 50.0), 3.0, 100.0);
        assert_eq!(light.irradiance(Vec3::ZERO, Vec3::NEG_Z), 0.0);
    }

    #[test]
    fn out_of_range_points_get_nothing() {
        let light = PointLight::new(Vec3::ZERO, 1.0, 10.0);
        assert_eq!(light.attenuation(12.0), 0.0);
        assert_eq!(light.attenuation(0.0), 1.0);
    }
}
