use glam::Vec2;

use crate::paint::Color;

/// Decoded RGBA8 image, sRGB-encoded, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageData {
    /// Wraps raw RGBA8 pixels. Returns `None` if the buffer length does not match.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (width > 0 && height > 0 && pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-color image.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Width over height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let i = (y * self.width as usize + x) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Nearest texel for `uv` in `[0, 1]²`; coordinates are clamped to the edge.
    pub fn sample_nearest(&self, uv: Vec2) -> [u8; 4] {
        let u = uv.x.clamp(0.0, 1.0);
        let v = uv.y.clamp(0.0, 1.0);
        let x = (u * self.width as f32) as u32;
        let y = (v * self.height as f32) as u32;
        self.pixel(x, y)
    }

    /// [`sample_nearest`](Self::sample_nearest) decoded to linear color.
    pub fn sample_linear(&self, uv: Vec2) -> Color {
        let [r, g, b, a] = self.sample_nearest(uv);
        Color::from_srgb_u8(r, g, b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffers() {
        assert!(ImageData::from_rgba8(2, 2, vec![0; 15]).is_none());
        assert!(ImageData::from_rgba8(0, 2, vec![]).is_none());
        assert!(ImageData::from_rgba8(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn sampling_clamps_to_edges() {
        let mut pixels = vec![0u8; 8];
        pixels[4..8].copy_from_slice(&[255, 255, 255, 255]);
        let image = ImageData::from_rgba8(2, 1, pixels).unwrap();

        assert_eq!(image.sample_nearest(Vec2::new(0.0, 0.0)), [0, 0, 0, 0]);
        assert_eq!(image.sample_nearest(Vec2::new(1.0, 1.0)), [255; 4]);
        assert_eq!(image.sample_nearest(Vec2::new(-3.0, 0.5)), [0, 0, 0, 0]);
    }
}
