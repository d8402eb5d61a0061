use crate::coords::Viewport;

/// GPU color buffer that one pass writes and a later pass samples.
///
/// Recreated only when the requested size or format differs from the current one.
#[derive(Default)]
pub struct OffscreenTarget {
    label: &'static str,
    size: Viewport,
    format: Option<wgpu::TextureFormat>,
    texture: Option<wgpu::Texture>,
    view: Option<wgpu::TextureView>,
    generation: u64,
}

impl OffscreenTarget {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            ..Self::default()
        }
    }

    pub fn size(&self) -> Viewport {
        self.size
    }

    pub fn view(&self) -> Option<&wgpu::TextureView> {
        self.view.as_ref()
    }

    /// Bumped on every reallocation; bind groups sampling the target compare against it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Makes sure the texture exists with `size` and `format`. Returns `true` if it was (re)created.
    pub fn ensure(&mut self, device: &wgpu::Device, size: Viewport, format: wgpu::TextureFormat) -> bool {
        let size = Viewport::new(size.width.max(1), size.height.max(1));
        if self.texture.is_some() && self.size == size && self.format == Some(format) {
            return false;
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(self.label),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!("{}: allocated {}x{} {:?}", self.label, size.width, size.height, format);
        self.size = size;
        self.format = Some(format);
        self.texture = Some(texture);
        self.view = Some(view);
        self.generation = self.generation.wrapping_add(1);
        true
    }
}
