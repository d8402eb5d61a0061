use slotmap::{new_key_type, SlotMap};

use crate::paint::Color;

use super::{CameraId, PointLight, SceneElement};

new_key_type! {
    /// Handle to an element owned by a [`Scene`].
    pub struct NodeId;
}

/// Flat, insertion-ordered collection of elements, lights and one active camera.
///
/// Elements are owned by the scene; [`Scene::remove`] hands ownership back.
#[derive(Debug)]
pub struct Scene {
    elements: SlotMap<NodeId, SceneElement>,
    order: Vec<NodeId>,
    lights: Vec<PointLight>,
    camera: CameraId,
    pub clear_color: Color,
}

impl Scene {
    pub fn new(camera: CameraId) -> Self {
        Self {
            elements: SlotMap::with_key(),
            order: Vec::new(),
            lights: Vec::new(),
            camera,
            clear_color: Color::TRANSPARENT,
        }
    }

    pub fn camera(&self) -> CameraId {
        self.camera
    }

    pub fn add(&mut self, element: SceneElement) -> NodeId {
        let id = self.elements.insert(element);
        self.order.push(id);
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Option<SceneElement> {
        let element = self.elements.remove(id)?;
        self.order.retain(|other| *other != id);
        Some(element)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneElement> {
        self.elements.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneElement> {
        self.elements.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneElement)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.elements.get(*id).map(|e| (*id, e)))
    }

    /// Mutable access in arbitrary order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut SceneElement> + '_ {
        self.elements.values_mut()
    }

    pub fn add_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::assets::{ImageData, TextureStore};
    use crate::material::{ProjectedMaterial, ProjectedMaterialDesc};
    use crate::scene::{Camera, CameraRegistry, Geometry, Transform};

    fn element_at(x: f32, cameras: &CameraRegistry, camera: CameraId, textures: &TextureStore) -> SceneElement {
        let texture = textures.ids().next();
        let desc = ProjectedMaterialDesc {
            camera: Some(camera),
            texture,
            ..Default::default()
        };
        let material = ProjectedMaterial::new(desc, cameras, textures).unwrap();
        SceneElement::new(
            Geometry::plane(1.0, 1.0),
            material,
            Transform::from_position(Vec3::new(x, 0.0, 0.0)),
        )
    }

    #[test]
    fn insertion_order_survives_removal() {
        let mut cameras = CameraRegistry::new();
        let camera = cameras.insert(Camera::orthographic(3.0, 1.0, -1.0, 1.0));
        let mut textures = TextureStore::new();
        textures.insert(ImageData::solid(1, 1, [0, 0, 0, 255]));

        let mut scene = Scene::new(camera);
        let a = scene.add(element_at(1.0, &cameras, camera, &textures));
        let b = scene.add(element_at(2.0, &cameras, camera, &textures));
        let c = scene.add(element_at(3.0, &cameras, camera, &textures));

        let removed = scene.remove(b).unwrap();
        assert_eq!(removed.transform.position.x, 2.0);
        assert!(scene.remove(b).is_none());

        let order: Vec<NodeId> = scene.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![a, c]);
        assert_eq!(scene.len(), 2);
    }
}
