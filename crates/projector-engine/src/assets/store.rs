use slotmap::{new_key_type, SlotMap};

use super::ImageData;

new_key_type! {
    /// Handle to a decoded image in a [`TextureStore`].
    pub struct TextureId;
}

/// CPU-side images, addressed by [`TextureId`]. GPU copies are made lazily by the renderer.
#[derive(Debug, Default)]
pub struct TextureStore {
    images: SlotMap<TextureId, ImageData>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image: ImageData) -> TextureId {
        self.images.insert(image)
    }

    pub fn remove(&mut self, id: TextureId) -> Option<ImageData> {
        self.images.remove(id)
    }

    pub fn get(&self, id: TextureId) -> Option<&ImageData> {
        self.images.get(id)
    }

    pub fn contains(&self, id: TextureId) -> bool {
        self.images.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.images.keys()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
