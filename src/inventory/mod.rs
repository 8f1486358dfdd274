//! # Inventory Model
//!
//! Entries (goods receipts), their articles and the boxes derived from them.
//!
//! ## Storage
//!
//! Articles and boxes are held in keyed maps rather than positional vectors:
//!
//! - [`ArticleSet`]: keyed by a stable [`ArticleId`], iterated in insertion order
//! - [`BoxSet`]: keyed by box number, iterated in box-number order
//!
//! Both serialize as plain JSON arrays so the wire format stays a list.
//! Transformations elsewhere in the crate take a set by reference and return
//! a new one; nothing edits a set through an index.

mod article;
mod entry;

pub use article::{Article, ArticleId, ArticleSet};
pub use entry::{BoxRecord, BoxSet, Entry};

use chrono::{DateTime, NaiveDate};

use crate::error::FieldIssue;

/// Parse a date field as `YYYY-MM-DD`, also accepting an RFC 3339 timestamp.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, FieldIssue> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.date_naive());
    }
    Err(FieldIssue::MalformedDate {
        field,
        value: value.to_string(),
    })
}

/// Treat `None`, empty and whitespace-only strings alike.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
