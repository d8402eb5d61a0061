/// A single acquired surface frame.
///
/// Short-lived: holding the surface texture blocks acquisition of the next frame.
/// Every pass of a frame records into the same `encoder`, so the offscreen pass is
/// always submitted ahead of the passes that sample its target.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
