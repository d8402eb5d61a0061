//! CPU reference renderer for the background scene.
//!
//! Shades the same elements as the offscreen pass by casting a ray through every
//! pixel center. Slow, but needs no GPU, which makes it the ground truth for tests
//! and for headless snapshots.

use glam::{Vec2, Vec3, Vec4};

use crate::assets::TextureStore;
use crate::coords::Viewport;
use crate::paint::{linear_to_srgb, Color};
use crate::scene::{CameraRegistry, Ray, Scene, SceneElement};

/// Premultiplied linear RGBA pixels, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftwareFrame {
    size: Viewport,
    pixels: Vec<[f32; 4]>,
}

impl SoftwareFrame {
    fn cleared(size: Viewport, clear: Color) -> Self {
        Self {
            size,
            pixels: vec![clear.premultiplied(); size.width as usize * size.height as usize],
        }
    }

    pub fn size(&self) -> Viewport {
        self.size
    }

    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels[(y * self.size.width + x) as usize]
    }

    /// Whether `(x, y)` still holds the clear color.
    pub fn is_clear(&self, x: u32, y: u32, clear: Color) -> bool {
        self.pixel(x, y) == clear.premultiplied()
    }

    /// Straight-alpha sRGB bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for [r, g, b, a] in &self.pixels {
            let unpremul = |c: f32| if *a > 0.0 { c / a } else { 0.0 };
            let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
            out.push(byte(linear_to_srgb(unpremul(*r))));
            out.push(byte(linear_to_srgb(unpremul(*g))));
            out.push(byte(linear_to_srgb(unpremul(*b))));
            out.push(byte(*a));
        }
        out
    }
}

/// NDC of the center of pixel `(x, y)`.
pub fn pixel_to_ndc(x: u32, y: u32, size: Viewport) -> Vec2 {
    Vec2::new(
        (x as f32 + 0.5) / size.width as f32 * 2.0 - 1.0,
        1.0 - (y as f32 + 0.5) / size.height as f32 * 2.0,
    )
}

/// Renders `scene` as seen by its camera. Elements whose camera or texture is
/// missing are skipped.
pub fn render_scene(
    scene: &Scene,
    cameras: &CameraRegistry,
    textures: &TextureStore,
    size: Viewport,
) -> Option<SoftwareFrame> {
    let camera = cameras.get(scene.camera())?;
    let mut frame = SoftwareFrame::cleared(size, scene.clear_color);

    // Back to front, same order as the GPU pass.
    let mut elements: Vec<&SceneElement> = scene.iter().map(|(_, e)| e).collect();
    elements.sort_by(|a, b| {
        camera
            .view_depth(b.transform.position)
            .total_cmp(&camera.view_depth(a.transform.position))
    });

    for y in 0..size.height {
        for x in 0..size.width {
            let ray = camera.ray_through(pixel_to_ndc(x, y, size));
            let index = (y * size.width + x) as usize;
            for element in &elements {
                if let Some(src) = shade_element(element, scene, textures, ray) {
                    let dst = &mut frame.pixels[index];
                    for c in 0..4 {
                        dst[c] = src[c] + dst[c] * (1.0 - src[3]);
                    }
                }
            }
        }
    }
    Some(frame)
}

fn shade_element(
    element: &SceneElement,
    scene: &Scene,
    textures: &TextureStore,
    ray: Ray,
) -> Option<[f32; 4]> {
    let model = element.transform.matrix();
    let inverse = model.inverse();

    // Intersect in object space, where the plane is z = 0.
    let origin = inverse * ray.origin.extend(1.0);
    let direction = inverse * ray.direction.extend(0.0);
    if direction.z.abs() < 1e-8 {
        return None;
    }
    let t = -origin.z / direction.z;
    if t < 0.0 {
        return None;
    }
    let local: Vec4 = origin + direction * t;
    let local = local.truncate();
    if !element.geometry.contains(local.truncate()) {
        return None;
    }

    let image = textures.get(element.material.texture())?;
    let color = element.material.shade(local, |uv| image.sample_linear(uv))?;

    let world = model.transform_point3(local);
    let normal = model.transform_vector3(element.geometry.normal()).normalize_or_zero();
    let mut light = Vec3::ZERO;
    for l in scene.lights() {
        let color = Vec3::new(l.color.r, l.color.g, l.color.b);
        light += color * l.irradiance(world, normal);
    }

    let rgb = (Vec3::new(color.r, color.g, color.b) * light).clamp(Vec3::ZERO, Vec3::ONE);
    let a = color.a;
    Some([rgb.x * a, rgb.y * a, rgb.z * a, a])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ImageData;
    use crate::material::{project, ProjectedMaterial, ProjectedMaterialDesc};
    use crate::scene::{Camera, Geometry, PointLight, Transform};

    fn stage(transparent: bool, texture_scale: f32) -> (Scene, CameraRegistry, TextureStore) {
        let mut cameras = CameraRegistry::new();
        let mut camera = Camera::orthographic(3.0, 1.0, -1000.0, 1000.0);
        camera.set_position(Vec3::new(0.0, 0.0, 3.0));
        let camera_id = cameras.insert(camera);

        let mut textures = TextureStore::new();
        let texture = textures.insert(ImageData::solid(8, 8, [255, 255, 255, 255]));

        let mut scene = Scene::new(camera_id);
        scene.add_light(PointLight::new(Vec3::new(0.0, 0.0, 50.0), 3.0, 100.0));

        let material = ProjectedMaterial::new(
            ProjectedMaterialDesc {
                camera: Some(camera_id),
                texture: Some(texture),
                color: Color::from_srgb_u8(0x31, 0x49, 0xD5, 255),
                texture_scale,
                transparent,
            },
            &cameras,
            &textures,
        )
        .unwrap();
        let mut element = SceneElement::new(Geometry::plane(3.0, 3.0), material, Transform::IDENTITY);
        project(&mut element, &cameras, &textures).unwrap();
        scene.add(element);

        (scene, cameras, textures)
    }

    #[test]
    fn only_the_projected_footprint_is_drawn() {
        let (scene, cameras, textures) = stage(true, 0.5);
        let size = Viewport::new(40, 40);
        let frame = render_scene(&scene, &cameras, &textures, size).unwrap();

        let mut drawn = 0;
        for y in 0..size.height {
            for x in 0..size.width {
                let ndc = pixel_to_ndc(x, y, size);
                let inside = ndc.x.abs() <= 0.5 && ndc.y.abs() <= 0.5;
                if !frame.is_clear(x, y, scene.clear_color) {
                    drawn += 1;
                    assert!(inside, "pixel ({x}, {y}) drawn outside the footprint");
                }
            }
        }
        assert!(drawn > 0);
        assert!(!frame.is_clear(20, 20, scene.clear_color));
    }

    #[test]
    fn opaque_material_keeps_tint_outside_footprint() {
        let (scene, cameras, textures) = stage(false, 0.5);
        let frame = render_scene(&scene, &cameras, &textures, Viewport::new(20, 20)).unwrap();

        let corner = frame.pixel(0, 0);
        let center = frame.pixel(10, 10);
        assert_eq!(corner[3], 1.0);
        // White slide in the middle, blue tint at the edge.
        assert!(center[0] > corner[0]);
        assert!(corner[2] > corner[0]);
    }

    #[test]
    fn frame_converts_to_bytes() {
        let (scene, cameras, textures) = stage(true, 0.5);
        let frame = render_scene(&scene, &cameras, &textures, Viewport::new(4, 4)).unwrap();
        let bytes = frame.to_rgba8();
        assert_eq!(bytes.len(), 4 * 4 * 4);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 0]);
    }
}
