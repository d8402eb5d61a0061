use std::collections::HashMap;

use crate::assets::{TextureId, TextureStore};
use crate::coords::Viewport;
use crate::overlay::DynamicTexture;

use super::RenderCtx;

pub(super) struct GpuTexture {
    pub view: wgpu::TextureView,
    _texture: wgpu::Texture,
}

fn create_texture(
    ctx: &RenderCtx<'_>,
    label: &str,
    size: Viewport,
    format: wgpu::TextureFormat,
) -> wgpu::Texture {
    ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn upload(ctx: &RenderCtx<'_>, texture: &wgpu::Texture, size: Viewport, bytes_per_pixel: u32, pixels: &[u8]) {
    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(size.width * bytes_per_pixel),
            rows_per_image: Some(size.height),
        },
        wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
    );
}

/// Drops every entry keyed by a texture the store no longer holds.
pub(super) fn retain_stored<V>(map: &mut HashMap<TextureId, V>, store: &TextureStore) {
    map.retain(|id, _| store.contains(*id));
}

/// GPU copies of [`TextureStore`] images, uploaded on first use.
#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<TextureId, GpuTexture>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads `id` if needed. Returns `None` when the store no longer has it.
    pub(super) fn ensure(&mut self, ctx: &RenderCtx<'_>, store: &TextureStore, id: TextureId) -> Option<&GpuTexture> {
        if !self.textures.contains_key(&id) {
            let image = store.get(id)?;
            let size = Viewport::new(image.width(), image.height());
            let texture = create_texture(ctx, "projector slide texture", size, wgpu::TextureFormat::Rgba8UnormSrgb);
            upload(ctx, &texture, size, 4, image.pixels());
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            self.textures.insert(id, GpuTexture { view, _texture: texture });
        }
        self.textures.get(&id)
    }

    /// Drops GPU copies whose image left the store.
    pub fn retain_live(&mut self, store: &TextureStore) {
        retain_stored(&mut self.textures, store);
    }
}

/// R8 GPU mirror of a [`DynamicTexture`].
#[derive(Default)]
pub struct OverlayTexture {
    size: Viewport,
    texture: Option<wgpu::Texture>,
    view: Option<wgpu::TextureView>,
    generation: u64,
}

impl OverlayTexture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> Option<&wgpu::TextureView> {
        self.view.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reallocates on size change and uploads when the canvas reports new pixels.
    pub fn sync(&mut self, ctx: &RenderCtx<'_>, canvas: &mut dyn DynamicTexture) {
        let size = canvas.size();
        let mut dirty = canvas.take_dirty();

        if self.texture.is_none() || self.size != size {
            let texture = create_texture(ctx, canvas.label(), size, wgpu::TextureFormat::R8Unorm);
            self.view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
            self.texture = Some(texture);
            self.size = size;
            self.generation = self.generation.wrapping_add(1);
            dirty = true;
        }

        let expected = size.width as usize * size.height as usize;
        if dirty && size.is_valid() && canvas.pixels().len() == expected {
            if let Some(texture) = self.texture.as_ref() {
                upload(ctx, texture, size, 1, canvas.pixels());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ImageData;

    #[test]
    fn entries_for_removed_textures_are_dropped() {
        let mut store = TextureStore::new();
        let kept = store.insert(ImageData::solid(1, 1, [255; 4]));
        let removed = store.insert(ImageData::solid(1, 1, [0; 4]));

        let mut bound = HashMap::from([(kept, "kept"), (removed, "removed")]);
        store.remove(removed);
        retain_stored(&mut bound, &store);

        assert_eq!(bound.len(), 1);
        assert_eq!(bound.get(&kept), Some(&"kept"));
    }
}
