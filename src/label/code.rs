//! Machine-readable codes: the QR payload and the Code 128 box-id strip.
//!
//! Uses the qrcode crate for QR and the barcoders crate for Code 128.

use barcoders::sym::code128::Code128;
use qrcode::{Color, EcLevel, QrCode};

use super::canvas::{Canvas, Rect};
use crate::error::WarelabelError;

/// A square QR symbol as a row-major module grid.
#[derive(Debug, Clone)]
pub struct QrModules {
    /// Modules per side.
    pub size: usize,
    /// `size * size` cells, true = dark.
    pub cells: Vec<bool>,
}

/// Encode `data` as a QR symbol at error correction level M.
pub fn encode_qr(data: &str) -> Result<QrModules, WarelabelError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)
        .map_err(|e| WarelabelError::Render(format!("QR code generation failed: {}", e)))?;

    let size = code.width();
    let mut cells = Vec::with_capacity(size * size);
    for qy in 0..size {
        for qx in 0..size {
            cells.push(code[(qx, qy)] == Color::Dark);
        }
    }
    Ok(QrModules { size, cells })
}

/// Draw `qr` centred in `area` with the largest whole-pixel module size.
///
/// Fails if the symbol has more modules than the area has pixels.
pub fn draw_qr(canvas: &mut Canvas, qr: &QrModules, area: Rect) -> Result<usize, WarelabelError> {
    let side = area.width.min(area.height);
    let module = side / qr.size.max(1);
    if module == 0 {
        return Err(WarelabelError::Render(format!(
            "payload needs {} QR modules but the code area is only {} px",
            qr.size, side
        )));
    }

    let pixel_size = qr.size * module;
    let x = area.x + (area.width - pixel_size) / 2;
    let y = area.y + (area.height - pixel_size) / 2;
    canvas.draw_modules(x, y, qr.size, module, &qr.cells);
    Ok(module)
}

/// Encode data as Code 128 bars.
/// Returns a Vec<bool> where true = bar (black), false = space (white),
/// or an empty Vec if the data cannot be encoded.
pub fn encode_code128(data: &str) -> Vec<bool> {
    // Character set B covers upper/lower case, digits and punctuation
    let prefixed_data = format!("\u{0181}{}", data);

    match Code128::new(&prefixed_data) {
        Ok(barcode) => barcode.encode().into_iter().map(|m| m == 1).collect(),
        Err(_) => Vec::new(),
    }
}

/// Draw bars stretched to the strip height, centred horizontally.
///
/// Returns false (drawing nothing) when the bars do not fit at one pixel per
/// module.
pub fn draw_bars(canvas: &mut Canvas, bars: &[bool], strip: Rect) -> bool {
    if bars.is_empty() {
        return false;
    }
    let module = strip.width / bars.len();
    if module == 0 {
        return false;
    }

    let x0 = strip.x + (strip.width - bars.len() * module) / 2;
    for (i, &bar) in bars.iter().enumerate() {
        if bar {
            canvas.fill_rect(Rect::new(x0 + i * module, strip.y, module, strip.height));
        }
    }
    true
}
