//! Bitmap glyphs for label text.
//!
//! Uses the Spleen bitmap font family. Each text size on a label is given in
//! inches; the pixel height is derived from the DPI and the closest Spleen
//! face is scaled to it with nearest-neighbour sampling. All faces are
//! monospace at a 1:2 aspect ratio, so measuring text is a multiplication.

use std::collections::HashMap;

use spleen_font::{FONT_6X12, FONT_8X16, FONT_12X24, PSF2Font};

/// Source Spleen face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Spleen6x12,
    Spleen8x16,
    Spleen12x24,
}

impl Face {
    /// Face whose native height is closest to, but not above, `pixel_height`
    /// (the smallest face is used below 16px).
    pub fn for_height(pixel_height: usize) -> Self {
        if pixel_height >= 24 {
            Self::Spleen12x24
        } else if pixel_height >= 16 {
            Self::Spleen8x16
        } else {
            Self::Spleen6x12
        }
    }

    pub fn native_size(self) -> (usize, usize) {
        match self {
            Self::Spleen6x12 => (6, 12),
            Self::Spleen8x16 => (8, 16),
            Self::Spleen12x24 => (12, 24),
        }
    }

    fn data(self) -> &'static [u8] {
        match self {
            Self::Spleen6x12 => FONT_6X12,
            Self::Spleen8x16 => FONT_8X16,
            Self::Spleen12x24 => FONT_12X24,
        }
    }
}

/// Pixel metrics of one text size at one DPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    pub char_width: usize,
    pub char_height: usize,
    pub face: Face,
}

impl FontMetrics {
    /// Metrics for a glyph `pixel_height` pixels tall.
    pub fn for_height(pixel_height: usize) -> Self {
        let char_height = pixel_height.max(1);
        let face = Face::for_height(char_height);
        let (w, h) = face.native_size();
        Self {
            char_width: (char_height * w / h).max(1),
            char_height,
            face,
        }
    }

    /// Rendered width of `text` in pixels.
    pub fn measure(&self, text: &str) -> usize {
        text.chars().count() * self.char_width
    }

    /// How many characters fit in `width` pixels.
    pub fn chars_fitting(&self, width: usize) -> usize {
        width / self.char_width
    }
}

/// A scaled glyph: `width * height` cells, 1 = ink.
#[derive(Debug, Clone)]
pub struct Glyph {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

/// Glyph cache keyed by face, character and target size.
#[derive(Default)]
pub struct GlyphCache {
    native: HashMap<(Face, char), Vec<u8>>,
    scaled: HashMap<(Face, char, usize, usize), Glyph>,
}

impl GlyphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Glyph for `ch` scaled to `metrics`.
    pub fn glyph(&mut self, metrics: FontMetrics, ch: char) -> &Glyph {
        let key = (metrics.face, ch, metrics.char_width, metrics.char_height);
        if !self.scaled.contains_key(&key) {
            let (src_w, src_h) = metrics.face.native_size();
            let native = self
                .native
                .entry((metrics.face, ch))
                .or_insert_with(|| native_glyph(metrics.face, ch));

            let mut data = vec![0u8; metrics.char_width * metrics.char_height];
            scale_bitmap(
                native,
                src_w,
                src_h,
                &mut data,
                metrics.char_width,
                metrics.char_height,
            );
            self.scaled.insert(
                key,
                Glyph {
                    width: metrics.char_width,
                    height: metrics.char_height,
                    data,
                },
            );
        }
        &self.scaled[&key]
    }
}

/// Generate a glyph bitmap at the face's native size.
/// Each byte is 0 (white) or 1 (black).
fn native_glyph(face: Face, ch: char) -> Vec<u8> {
    let (w, h) = face.native_size();
    let mut glyph = vec![0u8; w * h];

    let utf8_bytes = ch.to_string();
    let mut spleen = PSF2Font::new(face.data()).ok();

    if let Some(spleen_glyph) = spleen
        .as_mut()
        .and_then(|font| font.glyph_for_utf8(utf8_bytes.as_bytes()))
    {
        for (row_y, row) in spleen_glyph.enumerate() {
            for (col_x, on) in row.enumerate() {
                if row_y < h && col_x < w {
                    glyph[row_y * w + col_x] = if on { 1 } else { 0 };
                }
            }
        }
    } else if !ch.is_whitespace() {
        // Unknown character: draw a box
        draw_box(&mut glyph, w, h);
    }

    glyph
}

/// Scale a bitmap from src dimensions to dst dimensions using nearest neighbor.
fn scale_bitmap(src: &[u8], src_w: usize, src_h: usize, dst: &mut [u8], dst_w: usize, dst_h: usize) {
    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let sx = dx * src_w / dst_w;
            let sy = dy * src_h / dst_h;
            let src_idx = sy * src_w + sx;
            let dst_idx = dy * dst_w + dx;
            if src_idx < src.len() && dst_idx < dst.len() {
                dst[dst_idx] = src[src_idx];
            }
        }
    }
}

/// Draw a box outline in the glyph buffer.
fn draw_box(glyph: &mut [u8], width: usize, height: usize) {
    for x in 1..width - 1 {
        glyph[2 * width + x] = 1;
        glyph[(height - 2) * width + x] = 1;
    }
    for y in 2..height - 1 {
        glyph[y * width + 1] = 1;
        glyph[y * width + width - 2] = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_selection() {
        assert_eq!(Face::for_height(10), Face::Spleen6x12);
        assert_eq!(Face::for_height(16), Face::Spleen8x16);
        assert_eq!(Face::for_height(23), Face::Spleen8x16);
        assert_eq!(Face::for_height(48), Face::Spleen12x24);
    }

    #[test]
    fn test_metrics_half_width() {
        let m = FontMetrics::for_height(24);
        assert_eq!(m.char_width, 12);
        assert_eq!(m.measure("ABCD"), 48);
        assert_eq!(m.chars_fitting(50), 4);
    }

    #[test]
    fn test_glyph_has_ink() {
        let mut cache = GlyphCache::new();
        let g = cache.glyph(FontMetrics::for_height(32), 'A');
        assert_eq!(g.width, 16);
        assert_eq!(g.height, 32);
        assert!(g.data.iter().any(|&p| p == 1));
    }

    #[test]
    fn test_space_is_blank() {
        let mut cache = GlyphCache::new();
        let g = cache.glyph(FontMetrics::for_height(24), ' ');
        assert!(g.data.iter().all(|&p| p == 0));
    }
}
