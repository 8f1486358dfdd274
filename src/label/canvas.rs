//! Fixed-size 1-bit drawing surface.
//!
//! Coordinates are pixels from the top-left corner. Drawing outside the
//! surface, or outside the current clip rectangle, is silently dropped.

use image::{GrayImage, Luma};

use super::font::{FontMetrics, GlyphCache};

/// Axis-aligned rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> usize {
        self.x + self.width
    }

    pub fn bottom(&self) -> usize {
        self.y + self.height
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

pub struct Canvas {
    width: usize,
    height: usize,
    /// One byte per pixel, 1 = black.
    buffer: Vec<u8>,
    clip: Rect,
    glyphs: GlyphCache,
}

impl Canvas {
    /// A white canvas.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            buffer: vec![0u8; width * height],
            clip: Rect::new(0, 0, width, height),
            glyphs: GlyphCache::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Restrict subsequent drawing to `rect`.
    pub fn set_clip(&mut self, rect: Rect) {
        self.clip = rect;
    }

    /// Remove the clip rectangle.
    pub fn reset_clip(&mut self) {
        self.clip = Rect::new(0, 0, self.width, self.height);
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, black: bool) {
        if x >= self.width || y >= self.height || !self.clip.contains(x, y) {
            return;
        }
        self.buffer[y * self.width + x] = if black { 1 } else { 0 };
    }

    pub fn is_black(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.buffer[y * self.width + x] != 0
    }

    pub fn fill_rect(&mut self, rect: Rect) {
        for y in rect.y..rect.bottom().min(self.height) {
            for x in rect.x..rect.right().min(self.width) {
                self.set_pixel(x, y, true);
            }
        }
    }

    /// Draw a frame `thickness` pixels wide along the inside edge of `rect`.
    pub fn stroke_rect(&mut self, rect: Rect, thickness: usize) {
        let t = thickness.min(rect.width / 2).min(rect.height / 2).max(1);
        self.fill_rect(Rect::new(rect.x, rect.y, rect.width, t));
        self.fill_rect(Rect::new(rect.x, rect.bottom() - t, rect.width, t));
        self.fill_rect(Rect::new(rect.x, rect.y, t, rect.height));
        self.fill_rect(Rect::new(rect.right() - t, rect.y, t, rect.height));
    }

    /// Draw a square grid of modules (QR cells, barcode bars) scaled by
    /// `module` pixels, with the top-left module at (`x`, `y`).
    pub fn draw_modules(&mut self, x: usize, y: usize, columns: usize, module: usize, cells: &[bool]) {
        for (i, &dark) in cells.iter().enumerate() {
            if !dark {
                continue;
            }
            let cx = x + (i % columns) * module;
            let cy = y + (i / columns) * module;
            self.fill_rect(Rect::new(cx, cy, module, module));
        }
    }

    /// Draw a single line of text with its top-left corner at (`x`, `y`).
    /// Returns the drawn width in pixels.
    pub fn draw_text(&mut self, x: usize, y: usize, text: &str, metrics: FontMetrics, bold: bool) -> usize {
        let mut cursor = x;
        for ch in text.chars() {
            let glyph = self.glyphs.glyph(metrics, ch).clone();
            for gy in 0..glyph.height {
                for gx in 0..glyph.width {
                    if glyph.data[gy * glyph.width + gx] == 1 {
                        self.set_pixel(cursor + gx, y + gy, true);
                        if bold {
                            self.set_pixel(cursor + gx + 1, y + gy, true);
                        }
                    }
                }
            }
            cursor += metrics.char_width;
        }
        cursor - x
    }

    /// Convert to an 8-bit grayscale image (0 = black, 255 = white).
    pub fn to_image(&self) -> GrayImage {
        let mut img = GrayImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            for x in 0..self.width {
                let color = if self.buffer[y * self.width + x] != 0 { 0u8 } else { 255u8 };
                img.put_pixel(x as u32, y as u32, Luma([color]));
            }
        }
        img
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_canvas_is_white() {
        let canvas = Canvas::new(10, 5);
        assert!((0..10).all(|x| (0..5).all(|y| !canvas.is_black(x, y))));
    }

    #[test]
    fn test_stroke_rect_draws_frame_only() {
        let mut canvas = Canvas::new(20, 20);
        canvas.stroke_rect(Rect::new(0, 0, 20, 20), 2);
        assert!(canvas.is_black(0, 0));
        assert!(canvas.is_black(19, 19));
        assert!(canvas.is_black(1, 10));
        assert!(!canvas.is_black(2, 10));
        assert!(!canvas.is_black(10, 10));
    }

    #[test]
    fn test_clip_blocks_drawing() {
        let mut canvas = Canvas::new(10, 10);
        canvas.set_clip(Rect::new(0, 0, 5, 10));
        canvas.fill_rect(Rect::new(0, 0, 10, 10));
        assert!(canvas.is_black(4, 4));
        assert!(!canvas.is_black(5, 4));
        canvas.reset_clip();
        canvas.fill_rect(Rect::new(9, 9, 1, 1));
        assert!(canvas.is_black(9, 9));
    }

    #[test]
    fn test_draw_modules_scales() {
        let mut canvas = Canvas::new(8, 8);
        canvas.draw_modules(0, 0, 2, 4, &[true, false, false, true]);
        assert!(canvas.is_black(3, 3));
        assert!(!canvas.is_black(4, 0));
        assert!(canvas.is_black(7, 7));
    }

    #[test]
    fn test_draw_text_advances() {
        let mut canvas = Canvas::new(100, 30);
        let metrics = FontMetrics::for_height(24);
        let drawn = canvas.draw_text(0, 0, "Hi!", metrics, false);
        assert_eq!(drawn, 36);
        assert!((0..36).any(|x| (0..24).any(|y| canvas.is_black(x, y))));
    }

    #[test]
    fn test_to_image_colors() {
        let mut canvas = Canvas::new(2, 1);
        canvas.set_pixel(0, 0, true);
        let img = canvas.to_image();
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(1, 0)[0], 255);
    }
}
