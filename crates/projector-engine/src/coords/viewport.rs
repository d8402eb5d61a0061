/// Output size in physical pixels.
///
/// Everything sized to the output (offscreen target, overlay canvases, post
/// chain, the primary pass resolution uniform) is derived from one `Viewport`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `false` for minimized windows, which must not drive a resize.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Width over height. Only meaningful for a valid viewport.
    #[inline]
    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Scales both sides by `1 / factor`, never below one pixel.
    #[inline]
    pub fn downscaled(self, factor: u32) -> Self {
        let factor = factor.max(1);
        Self {
            width: (self.width / factor).max(1),
            height: (self.height / factor).max(1),
        }
    }

    #[inline]
    pub fn as_vec2(self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for Viewport {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_is_width_over_height() {
        assert_eq!(Viewport::new(1600, 900).aspect(), 1600.0 / 900.0);
    }

    #[test]
    fn zero_sized_viewport_is_invalid() {
        assert!(!Viewport::new(0, 720).is_valid());
        assert!(!Viewport::new(1280, 0).is_valid());
        assert!(Viewport::new(1, 1).is_valid());
    }

    #[test]
    fn downscale_never_reaches_zero() {
        assert_eq!(Viewport::new(3, 2).downscaled(4), Viewport::new(1, 1));
        assert_eq!(Viewport::new(1280, 720).downscaled(4), Viewport::new(320, 180));
    }
}
