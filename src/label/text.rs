//! Text block layout.
//!
//! Lines are placed top to bottom in priority order. The first five lines
//! are always placed; the remaining ones only when their full line height
//! still fits in the text area. Every line is truncated to the text width.
//! Mandatory lines that run past the area are logged and clipped at render.

use chrono::NaiveDate;
use tracing::debug;

use super::font::FontMetrics;
use super::geometry::Geometry;
use super::payload::LabelPayload;
use crate::inventory::{non_blank, parse_date};

const ELLIPSIS: &str = "...";

/// Which font a line uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Body,
    Small,
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub style: LineStyle,
    pub x: usize,
    pub y: usize,
}

impl PlacedLine {
    /// Whether the line extends below the text area.
    pub fn overflows(&self, geometry: &Geometry) -> bool {
        let metrics = metrics_for(geometry, self.style);
        self.y + Geometry::line_height(&metrics) > geometry.text.bottom()
    }
}

struct Candidate {
    text: String,
    style: LineStyle,
    always: bool,
}

fn format_date(value: &str) -> String {
    parse_date("date", value)
        .map(|d: NaiveDate| d.format("%d-%m-%Y").to_string())
        .unwrap_or_else(|_| value.to_string())
}

fn candidates(payload: &LabelPayload) -> Vec<Candidate> {
    let mut lines = vec![
        Candidate {
            text: payload.company.trim().to_uppercase(),
            style: LineStyle::Title,
            always: true,
        },
        Candidate {
            text: format!(
                "TXN {} | {}",
                payload.transaction_no.trim(),
                format_date(&payload.entry_date)
            ),
            style: LineStyle::Body,
            always: true,
        },
        Candidate {
            text: match non_blank(payload.sku_id.as_deref()) {
                Some(sku) => format!("BOX {}  SKU {}", payload.box_number, sku),
                None => format!("BOX {}", payload.box_number),
            },
            style: LineStyle::Body,
            always: true,
        },
        Candidate {
            text: payload.description.trim().to_string(),
            style: LineStyle::Body,
            always: true,
        },
        Candidate {
            text: format!(
                "NET {:.2} KG  GROSS {:.2} KG",
                payload.net_weight, payload.gross_weight
            ),
            style: LineStyle::Body,
            always: true,
        },
    ];

    let mfg = non_blank(payload.manufacturing_date.as_deref());
    let exp = non_blank(payload.expiry_date.as_deref());
    let dates = match (mfg, exp) {
        (Some(m), Some(e)) => Some(format!("MFG {}  EXP {}", format_date(m), format_date(e))),
        (Some(m), None) => Some(format!("MFG {}", format_date(m))),
        (None, Some(e)) => Some(format!("EXP {}", format_date(e))),
        (None, None) => None,
    };
    if let Some(text) = dates {
        lines.push(Candidate {
            text,
            style: LineStyle::Body,
            always: false,
        });
    }

    if let Some(batch) = non_blank(payload.batch_number.as_deref()) {
        lines.push(Candidate {
            text: format!("BATCH {}", batch),
            style: LineStyle::Body,
            always: false,
        });
    }

    if let Some(authority) = non_blank(payload.approval_authority.as_deref()) {
        lines.push(Candidate {
            text: format!("APPROVED BY {}", authority),
            style: LineStyle::Small,
            always: false,
        });
    }

    lines
}

/// Metrics for a line style.
pub fn metrics_for(geometry: &Geometry, style: LineStyle) -> FontMetrics {
    match style {
        LineStyle::Title => geometry.title_font,
        LineStyle::Body => geometry.body_font,
        LineStyle::Small => geometry.small_font,
    }
}

/// Lay out the text block for a payload.
pub fn layout_text(payload: &LabelPayload, geometry: &Geometry) -> Vec<PlacedLine> {
    let area = geometry.text;
    let mut y = area.y;
    let mut placed = Vec::new();

    for candidate in candidates(payload) {
        let metrics = metrics_for(geometry, candidate.style);
        let line_h = Geometry::line_height(&metrics);

        if !candidate.always && y + line_h > area.bottom() {
            continue;
        }

        let line = PlacedLine {
            text: truncate_to_width(&candidate.text, area.width, &metrics),
            style: candidate.style,
            x: area.x,
            y,
        };
        if line.overflows(geometry) {
            debug!(
                line = %line.text,
                y,
                line_height = line_h,
                bottom = area.bottom(),
                "mandatory label line runs past the text area"
            );
        }
        placed.push(line);
        y += line_h;
    }

    placed
}

/// Cut `text` so its rendered width fits `max_width` pixels.
///
/// Prefers cutting after the last whole word that fits (plus an ellipsis);
/// if not even the first word fits, keeps as many characters as fit
/// alongside the ellipsis.
pub fn truncate_to_width(text: &str, max_width: usize, metrics: &FontMetrics) -> String {
    if metrics.measure(text) <= max_width {
        return text.to_string();
    }

    let mut fitted = String::new();
    for word in text.split_whitespace() {
        let candidate = if fitted.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", fitted, word)
        };
        if metrics.measure(&candidate) + metrics.measure(ELLIPSIS) > max_width {
            break;
        }
        fitted = candidate;
    }

    if !fitted.is_empty() {
        return format!("{}{}", fitted, ELLIPSIS);
    }

    let budget = metrics.chars_fitting(max_width);
    if budget <= ELLIPSIS.len() {
        return ELLIPSIS.chars().take(budget).collect();
    }
    let head: String = text.chars().take(budget - ELLIPSIS.len()).collect();
    format!("{}{}", head, ELLIPSIS)
}
