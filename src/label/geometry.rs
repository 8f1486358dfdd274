//! # Label Geometry
//!
//! Every size on a label is specified in inches and converted to pixels at
//! render time, so the same layout is correct at any resolution.
//!
//! ## Standard 4×2 layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐ ← 0.05" border
//! │ ┌────────────┐ │ COMPANY                      │
//! │ │            │ │ TXN ... | DATE               │
//! │ │    QR      │ │ BOX n  SKU ...               │
//! │ │            │ │ description...               │
//! │ │            │ │ NET ... GROSS ...            │
//! │ └────────────┘ │ MFG ... EXP ...              │
//! │                │ [|||| code 128 strip ||||]   │ ← barcoded layout only
//! └──────────────────────────────────────────────┘
//!   ├── ~45% ────┤ ├──────── text block ─────────┤
//! ```
//!
//! ## Calculations
//!
//! ```text
//! pixels = round(inches × dpi)
//!
//! At 203 DPI:
//!   4" × 2"   → 812 × 406 px
//!   border    → 10 px
//!   body text → 24 px tall, 12 px per character
//! ```

use serde::{Deserialize, Serialize};

use super::canvas::Rect;
use super::font::FontMetrics;
use crate::error::WarelabelError;

/// Border rule weight.
pub const BORDER_IN: f64 = 0.05;
/// Space between the border and content, and between sections.
pub const PADDING_IN: f64 = 0.08;
/// Weight of the rule separating the code from the text block.
pub const DIVIDER_IN: f64 = 0.02;
/// Share of the label width given to the code section.
pub const CODE_SHARE: f64 = 0.45;
/// Height of the Code 128 strip in the barcoded layout.
pub const BARCODE_HEIGHT_IN: f64 = 0.28;

/// Text sizes, as glyph heights in inches.
pub const TITLE_TEXT_IN: f64 = 0.16;
pub const BODY_TEXT_IN: f64 = 0.12;
pub const SMALL_TEXT_IN: f64 = 0.09;
/// Line height as a multiple of glyph height.
pub const LINE_SPACING: f64 = 1.2;

/// Which sections the label carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelLayout {
    /// QR code and text block.
    #[default]
    Standard,
    /// Standard plus a Code 128 strip of the box identifier.
    Barcoded,
}

/// Physical label size and target resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSpec {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u16,
    pub layout: LabelLayout,
}

impl LabelSpec {
    /// 4×2 inch label at 203 DPI, the common thermal label size.
    pub const STANDARD_4X2: Self = Self {
        width_in: 4.0,
        height_in: 2.0,
        dpi: 203,
        layout: LabelLayout::Standard,
    };

    pub fn with_dpi(mut self, dpi: u16) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_layout(mut self, layout: LabelLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Convert inches to pixels (at least one pixel for any positive size).
    #[inline]
    pub fn px(&self, inches: f64) -> usize {
        if inches <= 0.0 {
            return 0;
        }
        ((inches * self.dpi as f64).round() as usize).max(1)
    }

    /// Pixel dimensions of the whole label.
    pub fn pixel_size(&self) -> (usize, usize) {
        (self.px(self.width_in), self.px(self.height_in))
    }

    pub fn check(&self) -> Result<(), WarelabelError> {
        if self.dpi == 0 {
            return Err(WarelabelError::Render("DPI must be positive".to_string()));
        }
        if !(self.width_in > 0.0 && self.height_in > 0.0)
            || !self.width_in.is_finite()
            || !self.height_in.is_finite()
        {
            return Err(WarelabelError::Render(format!(
                "invalid label size {}\" x {}\"",
                self.width_in, self.height_in
            )));
        }
        Ok(())
    }
}

impl Default for LabelSpec {
    fn default() -> Self {
        Self::STANDARD_4X2
    }
}

/// Pixel layout of one label, derived from a [`LabelSpec`].
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub width: usize,
    pub height: usize,
    pub border: usize,
    pub padding: usize,
    /// Square area the QR code is centred in.
    pub code: Rect,
    /// Vertical rule between code and text.
    pub divider: Rect,
    /// Area available to text lines.
    pub text: Rect,
    /// Code 128 strip, barcoded layout only.
    pub barcode: Option<Rect>,
    pub title_font: FontMetrics,
    pub body_font: FontMetrics,
    pub small_font: FontMetrics,
}

impl Geometry {
    pub fn for_spec(spec: &LabelSpec) -> Result<Self, WarelabelError> {
        spec.check()?;

        let (width, height) = spec.pixel_size();
        let border = spec.px(BORDER_IN);
        let padding = spec.px(PADDING_IN);
        let divider_w = spec.px(DIVIDER_IN);
        let inset = border + padding;

        if width <= 2 * inset + divider_w + 2 * padding || height <= 2 * inset {
            return Err(WarelabelError::Render(format!(
                "label {}x{} px is too small for its border and padding",
                width, height
            )));
        }

        let inner_h = height - 2 * inset;
        let code_section = ((width as f64) * CODE_SHARE).round() as usize;
        let code_side = inner_h.min(code_section.saturating_sub(inset + padding)).max(1);
        let code = Rect::new(inset, inset, code_side, code_side);

        let divider_x = code.right() + padding;
        let divider = Rect::new(divider_x, inset, divider_w, inner_h);

        let text_x = divider.right() + padding;
        let text_w = width.saturating_sub(inset + text_x);

        let (text_h, barcode) = match spec.layout {
            LabelLayout::Standard => (inner_h, None),
            LabelLayout::Barcoded => {
                let bar_h = spec.px(BARCODE_HEIGHT_IN).min(inner_h / 2);
                let strip = Rect::new(text_x, height - inset - bar_h, text_w, bar_h);
                (inner_h.saturating_sub(bar_h + padding), Some(strip))
            }
        };

        Ok(Self {
            width,
            height,
            border,
            padding,
            code,
            divider,
            text: Rect::new(text_x, inset, text_w, text_h),
            barcode,
            title_font: FontMetrics::for_height(spec.px(TITLE_TEXT_IN)),
            body_font: FontMetrics::for_height(spec.px(BODY_TEXT_IN)),
            small_font: FontMetrics::for_height(spec.px(SMALL_TEXT_IN)),
        })
    }

    /// Line pitch for a font.
    pub fn line_height(font: &FontMetrics) -> usize {
        ((font.char_height as f64) * LINE_SPACING).round() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_pixel_size() {
        assert_eq!(LabelSpec::STANDARD_4X2.pixel_size(), (812, 406));
    }

    #[test]
    fn test_doubling_dpi_doubles_size() {
        let spec = LabelSpec::STANDARD_4X2;
        let (w, h) = spec.pixel_size();
        let (w2, h2) = spec.with_dpi(406).pixel_size();
        assert_eq!((w2, h2), (w * 2, h * 2));
    }

    #[test]
    fn test_sections_do_not_overlap() {
        let g = Geometry::for_spec(&LabelSpec::STANDARD_4X2).unwrap();
        assert_eq!(g.border, 10);
        assert!(g.code.right() < g.divider.x);
        assert!(g.divider.right() < g.text.x);
        assert!(g.text.right() <= g.width - g.border);
        assert!(g.code.bottom() <= g.height - g.border);
        // code section sits in the left third to half
        assert!(g.text.x as f64 > g.width as f64 / 3.0);
        assert!((g.text.x as f64) < g.width as f64 * 0.55);
    }

    #[test]
    fn test_barcoded_layout_reserves_strip() {
        let spec = LabelSpec::STANDARD_4X2.with_layout(LabelLayout::Barcoded);
        let g = Geometry::for_spec(&spec).unwrap();
        let strip = g.barcode.unwrap();
        assert!(g.text.bottom() <= strip.y);
        assert_eq!(strip.x, g.text.x);
    }

    #[test]
    fn test_fonts_scale_with_dpi() {
        let low = Geometry::for_spec(&LabelSpec::STANDARD_4X2).unwrap();
        let high = Geometry::for_spec(&LabelSpec::STANDARD_4X2.with_dpi(406)).unwrap();
        assert_eq!(low.body_font.char_height, 24);
        assert_eq!(high.body_font.char_height, 49);
    }

    #[test]
    fn test_rejects_zero_dpi_and_tiny_labels() {
        assert!(Geometry::for_spec(&LabelSpec::STANDARD_4X2.with_dpi(0)).is_err());
        let tiny = LabelSpec {
            width_in: 0.2,
            height_in: 0.1,
            ..LabelSpec::default()
        };
        assert!(Geometry::for_spec(&tiny).is_err());
    }
}
