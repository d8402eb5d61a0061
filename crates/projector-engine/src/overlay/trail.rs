use std::collections::VecDeque;

use crate::coords::Viewport;

use super::{blank, DynamicTexture};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrailConfig {
    /// Canvas resolution is the output size divided by this.
    pub downscale: u32,
    /// Seconds a touch stays visible.
    pub max_age: f32,
    /// Radius as a fraction of the canvas height.
    pub radius: f32,
    pub max_touches: usize,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            downscale: 4,
            max_age: 1.0,
            radius: 0.08,
            max_touches: 64,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Touch {
    x: f32,
    y: f32,
    age: f32,
}

/// Fading trail of recent pointer positions.
#[derive(Debug)]
pub struct MouseTrail {
    config: TrailConfig,
    size: Viewport,
    pixels: Vec<u8>,
    touches: VecDeque<Touch>,
    dirty: bool,
}

impl MouseTrail {
    pub fn new(output: Viewport, config: TrailConfig) -> Self {
        let size = output.downscaled(config.downscale);
        Self {
            config,
            size,
            pixels: blank(size),
            touches: VecDeque::new(),
            dirty: true,
        }
    }

    /// Adds a touch at a normalized pointer position (`[-1, 1]`, +Y down).
    pub fn add_touch(&mut self, x: f32, y: f32) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        if self.touches.len() >= self.config.max_touches {
            self.touches.pop_front();
        }
        self.touches.push_back(Touch { x, y, age: 0.0 });
    }

    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    fn redraw(&mut self) {
        self.pixels.fill(0);
        let (w, h) = (self.size.width as f32, self.size.height as f32);
        let radius = (self.config.radius * h).max(1.0);

        for touch in &self.touches {
            let strength = (1.0 - touch.age / self.config.max_age).clamp(0.0, 1.0);
            let cx = (touch.x * 0.5 + 0.5) * w;
            let cy = (touch.y * 0.5 + 0.5) * h;

            let x0 = (cx - radius).floor().max(0.0) as u32;
            let x1 = (cx + radius).ceil().min(w - 1.0).max(0.0) as u32;
            let y0 = (cy - radius).floor().max(0.0) as u32;
            let y1 = (cy + radius).ceil().min(h - 1.0).max(0.0) as u32;

            for py in y0..=y1 {
                for px in x0..=x1 {
                    let dx = px as f32 + 0.5 - cx;
                    let dy = py as f32 + 0.5 - cy;
                    let falloff = 1.0 - (dx * dx + dy * dy).sqrt() / radius;
                    if falloff <= 0.0 {
                        continue;
                    }
                    // smoothstep
                    let falloff = falloff * falloff * (3.0 - 2.0 * falloff);
                    let value = (falloff * strength * 255.0) as u8;
                    let i = py as usize * self.size.width as usize + px as usize;
                    self.pixels[i] = self.pixels[i].max(value);
                }
            }
        }
    }
}

impl DynamicTexture for MouseTrail {
    fn label(&self) -> &'static str {
        "mouse trail"
    }

    fn size(&self) -> Viewport {
        self.size
    }

    fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn resize(&mut self, output: Viewport) {
        let size = output.downscaled(self.config.downscale);
        if size != self.size {
            self.size = size;
            self.pixels = blank(size);
            self.dirty = true;
        }
    }

    fn update(&mut self, _time: f32, dt: f32) {
        let had_touches = !self.touches.is_empty();
        let max_age = self.config.max_age;
        for touch in &mut self.touches {
            touch.age += dt.max(0.0);
        }
        self.touches.retain(|t| t.age < max_age);

        if had_touches || self.dirty {
            self.redraw();
            self.dirty = true;
        }
    }

    fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trail() -> MouseTrail {
        MouseTrail::new(Viewport::new(400, 400), TrailConfig::default())
    }

    #[test]
    fn canvas_is_quarter_resolution() {
        let mut trail = trail();
        assert_eq!(trail.size(), Viewport::new(100, 100));
        trail.resize(Viewport::new(800, 200));
        assert_eq!(trail.size(), Viewport::new(200, 50));
        assert_eq!(trail.pixels().len(), 200 * 50);
    }

    #[test]
    fn touch_lights_its_position() {
        let mut trail = trail();
        trail.add_touch(0.0, 0.0);
        trail.update(0.0, 0.016);

        assert!(trail.pixels()[50 * 100 + 50] > 200);
        assert_eq!(trail.pixels()[0], 0);
        assert!(trail.take_dirty());
        assert!(!trail.take_dirty());
    }

    #[test]
    fn touches_age_out() {
        let mut trail = trail();
        trail.add_touch(0.5, -0.5);
        trail.update(0.0, 0.5);
        assert_eq!(trail.touch_count(), 1);
        trail.update(0.0, 0.6);
        assert_eq!(trail.touch_count(), 0);
        assert!(trail.pixels().iter().all(|p| *p == 0));
    }

    #[test]
    fn touch_history_is_bounded() {
        let mut trail = trail();
        for i in 0..200 {
            trail.add_touch(i as f32 / 200.0, 0.0);
        }
        assert_eq!(trail.touch_count(), TrailConfig::default().max_touches);
    }
}
