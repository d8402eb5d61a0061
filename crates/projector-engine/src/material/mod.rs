//! Projected-texture material.
//!
//! A material is bound to a projector (a camera in the [`CameraRegistry`]) by
//! [`project`]. Binding copies the camera matrices and the element's model matrix
//! by value; from then on texture coordinates depend only on object-space
//! positions, so the image stays glued to the surface while it moves.

mod projected;
mod projection;

pub use projected::{ProjectedMaterial, ProjectedMaterialDesc, ProjectedUniforms};
pub use projection::{footprint, ProjectionBinding};

use crate::assets::TextureStore;
use crate::error::ConfigurationError;
use crate::scene::{CameraRegistry, SceneElement};

/// Binds `element`'s material to its reference camera as it is right now.
///
/// Later camera or element motion does not change the binding until this is
/// called again.
pub fn project(
    element: &mut SceneElement,
    cameras: &CameraRegistry,
    textures: &TextureStore,
) -> Result<(), ConfigurationError> {
    let camera_id = element.material.camera();
    let texture_id = element.material.texture();

    let camera = cameras
        .get(camera_id)
        .ok_or(ConfigurationError::UnknownCamera(camera_id))?;
    let image = textures
        .get(texture_id)
        .ok_or(ConfigurationError::UnknownTexture(texture_id))?;

    let model = element.transform.matrix();
    element.material.bind(camera, model, image.aspect());
    Ok(())
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::assets::{ImageData, TextureId};
    use crate::paint::Color;
    use crate::scene::{Camera, CameraId, Geometry, Transform};

    fn fixture() -> (CameraRegistry, CameraId, TextureStore, TextureId) {
        let mut cameras = CameraRegistry::new();
        let mut camera = Camera::orthographic(3.0, 1.0, -1000.0, 1000.0);
        camera.set_position(Vec3::new(0.0, 0.0, 3.0));
        let camera_id = cameras.insert(camera);

        let mut textures = TextureStore::new();
        let texture_id = textures.insert(ImageData::solid(4, 4, [255, 0, 0, 255]));
        (cameras, camera_id, textures, texture_id)
    }

    fn desc(camera: CameraId, texture: TextureId) -> ProjectedMaterialDesc {
        ProjectedMaterialDesc {
            camera: Some(camera),
            texture: Some(texture),
            color: Color::from_hex("#3149D5").unwrap(),
            texture_scale: 0.8,
            transparent: true,
        }
    }

    fn element(material: ProjectedMaterial, position: Vec3) -> SceneElement {
        SceneElement::new(
            Geometry::plane(0.3, 0.3),
            material,
            Transform::from_position(position).with_uniform_scale(1.4),
        )
    }

    #[test]
    fn missing_handles_fail_fast() {
        let (cameras, camera, textures, texture) = fixture();

        let no_camera = ProjectedMaterialDesc { camera: None, ..desc(camera, texture) };
        assert_eq!(
            ProjectedMaterial::new(no_camera, &cameras, &textures).unwrap_err(),
            ConfigurationError::MissingCamera
        );

        let no_texture = ProjectedMaterialDesc { texture: None, ..desc(camera, texture) };
        assert_eq!(
            ProjectedMaterial::new(no_texture, &cameras, &textures).unwrap_err(),
            ConfigurationError::MissingTexture
        );

        let bad_scale = ProjectedMaterialDesc { texture_scale: 0.0, ..desc(camera, texture) };
        assert!(matches!(
            ProjectedMaterial::new(bad_scale, &cameras, &textures),
            Err(ConfigurationError::InvalidTextureScale(_))
        ));
    }

    #[test]
    fn removed_camera_is_reported() {
        let (mut cameras, camera, textures, texture) = fixture();
        let material = ProjectedMaterial::new(desc(camera, texture), &cameras, &textures).unwrap();
        let mut element = element(material, Vec3::ZERO);

        cameras.remove(camera);
        assert_eq!(
            project(&mut element, &cameras, &textures),
            Err(ConfigurationError::UnknownCamera(camera))
        );
        assert!(!element.material.is_bound());
    }

    #[test]
    fn translating_after_projection_keeps_texture_coords() {
        let (cameras, camera, textures, texture) = fixture();
        let material = ProjectedMaterial::new(desc(camera, texture), &cameras, &textures).unwrap();
        let mut element = element(material, Vec3::new(0.3, -0.4, 1.5));
        project(&mut element, &cameras, &textures).unwrap();

        let samples = [
            Vec3::new(-0.15, -0.15, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.1, 0.15, 0.0),
        ];
        let before: Vec<Option<Vec2>> = samples
            .iter()
            .map(|p| element.material.binding().unwrap().texture_coord(*p))
            .collect();

        element.transform.position += Vec3::new(0.8, -0.5, 0.2);
        let after: Vec<Option<Vec2>> = samples
            .iter()
            .map(|p| element.material.binding().unwrap().texture_coord(*p))
            .collect();

        assert_eq!(before, after);
        assert!(before.iter().all(Option::is_some));
    }

    #[test]
    fn unbound_material_renders_unprojected() {
        let (cameras, camera, textures, texture) = fixture();
        let opaque = ProjectedMaterialDesc { transparent: false, ..desc(camera, texture) };
        let material = ProjectedMaterial::new(opaque, &cameras, &textures).unwrap();

        let shaded = material.shade(Vec3::ZERO, |_| Color::WHITE).unwrap();
        assert_eq!(shaded, material.color());
        assert_eq!(material.uniforms().params[3], 0.0);
    }

    #[test]
    fn inside_footprint_mixes_texel_over_tint() {
        let (cameras, camera, textures, texture) = fixture();
        let material = ProjectedMaterial::new(desc(camera, texture), &cameras, &textures).unwrap();
        let mut element = element(material, Vec3::ZERO);
        project(&mut element, &cameras, &textures).unwrap();
        element.material.set_opacity(0.5);

        let red = Color::new(1.0, 0.0, 0.0, 1.0);
        let shaded = element.material.shade(Vec3::ZERO, |_| red).unwrap();
        assert_eq!(shaded, red.with_alpha(0.5));

        let half = Color::new(1.0, 0.0, 0.0, 0.5);
        let tint = element.material.color();
        let shaded = element.material.shade(Vec3::ZERO, |_| half).unwrap();
        assert!((shaded.g - tint.g * 0.5).abs() < 1e-6);
    }

    #[test]
    fn transparent_material_discards_outside_footprint() {
        let (cameras, camera, textures, texture) = fixture();
        let material = ProjectedMaterial::new(desc(camera, texture), &cameras, &textures).unwrap();
        // Far enough right that the whole plane misses the image.
        let mut element = element(material, Vec3::new(10.0, 0.0, 0.0));
        project(&mut element, &cameras, &textures).unwrap();

        assert!(element.material.shade(Vec3::ZERO, |_| Color::WHITE).is_none());
    }

    #[test]
    fn opacity_change_refreshes_uniforms() {
        let (cameras, camera, textures, texture) = fixture();
        let mut material = ProjectedMaterial::new(desc(camera, texture), &cameras, &textures).unwrap();
        material.set_opacity(0.25);
        assert_eq!(material.uniforms().tint[3], 0.25);
        material.set_opacity(3.0);
        assert_eq!(material.opacity(), 1.0);
    }
}
