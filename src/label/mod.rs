//! # Label Compositor
//!
//! Renders one box label as a 1-bit raster of exact physical size.
//!
//! ## Pipeline
//!
//! ```text
//! LabelPayload ─ validate ─→ compact JSON ─→ QR modules ──┐
//!                                                         ├─→ Canvas → LabelImage
//! LabelSpec ──→ Geometry ──→ text layout (priority, fit) ─┘
//! ```
//!
//! Validation runs before anything is drawn, so an invalid payload never
//! produces a partial label.
//!
//! ## Example
//!
//! ```
//! use warelabel::label::{LabelPayload, LabelSpec, render_label};
//!
//! let payload = LabelPayload {
//!     company: "ACME".into(),
//!     transaction_no: "INW-1".into(),
//!     entry_date: "2024-03-15".into(),
//!     box_number: 1,
//!     description: "Wheat Flour".into(),
//!     net_weight: 10.0,
//!     gross_weight: 11.0,
//!     ..Default::default()
//! };
//!
//! let image = render_label(&payload, &LabelSpec::STANDARD_4X2).unwrap();
//! assert_eq!((image.width(), image.height()), (812, 406));
//! ```

pub mod canvas;
pub mod code;
pub mod font;
pub mod geometry;
pub mod payload;
pub mod text;

pub use geometry::{Geometry, LabelLayout, LabelSpec};
pub use payload::{LabelPayload, compact, compact_json, decompact, decompact_json};

use image::{GrayImage, ImageEncoder};

use crate::error::WarelabelError;
use canvas::Canvas;
use text::{LineStyle, layout_text, metrics_for};

/// A rendered label.
#[derive(Debug, Clone)]
pub struct LabelImage {
    pub box_number: u32,
    pub dpi: u16,
    pub image: GrayImage,
}

impl LabelImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_black(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] < 128
    }

    /// Encode as PNG bytes.
    pub fn to_png(&self) -> Result<Vec<u8>, WarelabelError> {
        let mut png_bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(
                self.image.as_raw(),
                self.image.width(),
                self.image.height(),
                image::ExtendedColorType::L8,
            )
            .map_err(|e: image::ImageError| WarelabelError::Render(e.to_string()))?;

        Ok(png_bytes)
    }
}

/// Render one label.
pub fn render_label(payload: &LabelPayload, spec: &LabelSpec) -> Result<LabelImage, WarelabelError> {
    payload.validate()?;

    let geometry = Geometry::for_spec(spec)?;
    let data = compact_json(payload)?;
    let qr = code::encode_qr(&data)?;

    let mut canvas = Canvas::new(geometry.width, geometry.height);

    // Frame and section rule
    canvas.stroke_rect(
        canvas::Rect::new(0, 0, geometry.width, geometry.height),
        geometry.border,
    );
    canvas.fill_rect(geometry.divider);

    code::draw_qr(&mut canvas, &qr, geometry.code).map_err(|e| {
        WarelabelError::Render(format!("box {}: {}", payload.box_number, e))
    })?;

    canvas.set_clip(geometry.text);
    for line in layout_text(payload, &geometry) {
        let metrics = metrics_for(&geometry, line.style);
        let bold = line.style == LineStyle::Title;
        canvas.draw_text(line.x, line.y, &line.text, metrics, bold);
    }
    canvas.reset_clip();

    if let (Some(strip), Some(box_id)) = (geometry.barcode, payload.box_id.as_deref()) {
        let bars = code::encode_code128(box_id);
        if !code::draw_bars(&mut canvas, &bars, strip) {
            tracing::debug!(box_number = payload.box_number, "box id barcode does not fit; skipped");
        }
    }

    Ok(LabelImage {
        box_number: payload.box_number,
        dpi: spec.dpi,
        image: canvas.to_image(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldIssue;

    fn payload() -> LabelPayload {
        LabelPayload {
            company: "ACME Foods".to_string(),
            transaction_no: "INW-2024-0042".to_string(),
            entry_date: "2024-03-15".to_string(),
            box_number: 2,
            box_id: Some("240315-WHEATFLOUR-2".to_string()),
            description: "Wheat Flour".to_string(),
            sku_id: Some("SKU-77".to_string()),
            net_weight: 10.0,
            gross_weight: 11.0,
            expiry_date: Some("2025-03-01".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_dimensions() {
        let img = render_label(&payload(), &LabelSpec::STANDARD_4X2).unwrap();
        assert_eq!((img.width(), img.height()), (812, 406));
        assert_eq!(img.box_number, 2);
    }

    #[test]
    fn test_render_is_deterministic() {
        let a = render_label(&payload(), &LabelSpec::STANDARD_4X2).unwrap();
        let b = render_label(&payload(), &LabelSpec::STANDARD_4X2).unwrap();
        assert_eq!(a.image.as_raw(), b.image.as_raw());
    }

    #[test]
    fn test_border_drawn() {
        let img = render_label(&payload(), &LabelSpec::STANDARD_4X2).unwrap();
        assert!(img.is_black(0, 0));
        assert!(img.is_black(811, 405));
        assert!(img.is_black(9, 200));
        assert!(!img.is_black(12, 380));
    }

    #[test]
    fn test_validation_before_render() {
        let mut p = payload();
        p.company = String::new();
        p.entry_date = "not a date".to_string();
        match render_label(&p, &LabelSpec::STANDARD_4X2) {
            Err(WarelabelError::Validation(v)) => {
                assert_eq!(v.missing_fields(), vec!["company"]);
                assert!(v.issues.iter().any(|i| matches!(i, FieldIssue::MalformedDate { .. })));
            }
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_barcoded_layout_draws_strip() {
        let spec = LabelSpec::STANDARD_4X2.with_layout(LabelLayout::Barcoded);
        let img = render_label(&payload(), &spec).unwrap();
        let strip = Geometry::for_spec(&spec).unwrap().barcode.unwrap();
        let mid_y = (strip.y + strip.height / 2) as u32;
        let dark = (strip.x..strip.right())
            .filter(|&x| img.is_black(x as u32, mid_y))
            .count();
        assert!(dark > 0);
    }

    #[test]
    fn test_png_encoding() {
        let img = render_label(&payload(), &LabelSpec::STANDARD_4X2).unwrap();
        let png = img.to_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 812);
    }
}
