use std::collections::HashMap;

use crate::coords::Viewport;

use super::{blank, DynamicTexture};

struct Glyph {
    metrics: fontdue::Metrics,
    coverage: Vec<u8>,
}

/// One line of text scrolling horizontally across the canvas.
///
/// Without a font the canvas stays blank; the primary pass still samples it.
pub struct TextCanvas {
    font: Option<fontdue::Font>,
    text: String,
    /// Glyph height as a fraction of the canvas height.
    scale: f32,
    /// Canvas widths per second.
    speed: f32,

    size: Viewport,
    pixels: Vec<u8>,
    glyphs: HashMap<char, Glyph>,
    glyph_px: f32,
    line_width: f32,
    dirty: bool,
}

impl TextCanvas {
    pub fn new(output: Viewport, font: Option<fontdue::Font>, text: impl Into<String>) -> Self {
        let mut canvas = Self {
            font,
            text: text.into(),
            scale: 0.25,
            speed: 0.1,
            size: output,
            pixels: blank(output),
            glyphs: HashMap::new(),
            glyph_px: 0.0,
            line_width: 0.0,
            dirty: true,
        };
        canvas.rebuild_glyphs();
        canvas
    }

    /// Parses a TrueType/OpenType font for use with [`TextCanvas::new`].
    pub fn load_font(bytes: &[u8]) -> anyhow::Result<fontdue::Font> {
        fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| anyhow::anyhow!("font load error: {e}"))
    }

    /// Width of the laid-out line in pixels.
    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    fn rebuild_glyphs(&mut self) {
        self.glyphs.clear();
        self.line_width = 0.0;
        self.glyph_px = (self.size.height as f32 * self.scale).max(1.0);
        self.dirty = true;

        let Some(font) = &self.font else {
            return;
        };
        for c in self.text.chars() {
            let (metrics, coverage) = font.rasterize(c, self.glyph_px);
            self.line_width += metrics.advance_width;
            self.glyphs.entry(c).or_insert(Glyph { metrics, coverage });
        }
    }

    fn draw(&mut self, offset: f32) {
        self.pixels.fill(0);
        if self.glyphs.is_empty() {
            return;
        }

        let (w, h) = (self.size.width as i32, self.size.height as i32);
        let baseline = (self.size.height as f32 * 0.5 + self.glyph_px * 0.35) as i32;
        let mut pen = offset;

        for c in self.text.chars() {
            let Some(glyph) = self.glyphs.get(&c) else {
                continue;
            };
            let m = &glyph.metrics;
            let left = (pen + m.xmin as f32).round() as i32;
            let top = baseline - m.height as i32 - m.ymin;

            for gy in 0..m.height as i32 {
                let y = top + gy;
                if y < 0 || y >= h {
                    continue;
                }
                for gx in 0..m.width as i32 {
                    let x = left + gx;
                    if x < 0 || x >= w {
                        continue;
                    }
                    let src = glyph.coverage[(gy * m.width as i32 + gx) as usize];
                    let dst = &mut self.pixels[(y * w + x) as usize];
                    *dst = (*dst).max(src);
                }
            }
            pen += m.advance_width;
        }
    }
}

impl DynamicTexture for TextCanvas {
    fn label(&self) -> &'static str {
        "text overlay"
    }

    fn size(&self) -> Viewport {
        self.size
    }

    fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn resize(&mut self, output: Viewport) {
        if output != self.size {
            self.size = output;
            self.pixels = blank(output);
            self.rebuild_glyphs();
        }
    }

    fn update(&mut self, time: f32, _dt: f32) {
        if self.glyphs.is_empty() {
            return;
        }
        // Enters from the right edge, leaves on the left, then wraps.
        let width = self.size.width as f32;
        let cycle = width + self.line_width;
        let travelled = (time * self.speed * width).rem_euclid(cycle);
        self.draw(width - travelled);
        self.dirty = true;
    }

    fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
