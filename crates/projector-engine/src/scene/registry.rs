use slotmap::{new_key_type, SlotMap};

use super::Camera;

new_key_type! {
    /// Handle to a camera owned by a [`CameraRegistry`].
    pub struct CameraId;
}

/// Owns every camera; everything else refers to cameras by [`CameraId`].
///
/// Materials keep only the handle and copy matrices out at bind time, so a camera
/// can move or be removed without leaving dangling references behind.
#[derive(Debug, Default)]
pub struct CameraRegistry {
    cameras: SlotMap<CameraId, Camera>,
}

impl CameraRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, camera: Camera) -> CameraId {
        self.cameras.insert(camera)
    }

    pub fn remove(&mut self, id: CameraId) -> Option<Camera> {
        self.cameras.remove(id)
    }

    pub fn get(&self, id: CameraId) -> Option<&Camera> {
        self.cameras.get(id)
    }

    pub fn get_mut(&mut self, id: CameraId) -> Option<&mut Camera> {
        self.cameras.get_mut(id)
    }

    pub fn contains(&self, id: CameraId) -> bool {
        self.cameras.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (CameraId, &mut Camera)> {
        self.cameras.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_handle_no_longer_resolves() {
        let mut registry = CameraRegistry::new();
        let id = registry.insert(Camera::orthographic(2.0, 1.0, 0.1, 10.0));
        assert!(registry.contains(id));

        registry.remove(id);
        assert!(registry.get(id).is_none());

        // Slot reuse must not resurrect the stale handle.
        let other = registry.insert(Camera::orthographic(2.0, 1.0, 0.1, 10.0));
        assert_ne!(id, other);
        assert!(registry.get(id).is_none());
    }
}
