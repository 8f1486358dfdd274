//! Deterministic box identifiers.
//!
//! An identifier is stable for the same (date, description, box number)
//! triple, so re-deriving boxes never changes the id of an unchanged box.

use chrono::NaiveDate;

/// Maximum characters of the description kept in an identifier.
const DESCRIPTION_CAP: usize = 12;

/// Placeholder used when a description has no alphanumeric characters.
const EMPTY_DESCRIPTION: &str = "ITEM";

/// Six-digit `YYMMDD` stamp.
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%y%m%d").to_string()
}

/// ASCII alphanumerics only, upper-cased, capped at 12 characters.
pub fn sanitize_description(description: &str) -> String {
    let cleaned: String = description
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .take(DESCRIPTION_CAP)
        .collect();

    if cleaned.is_empty() {
        EMPTY_DESCRIPTION.to_string()
    } else {
        cleaned
    }
}

/// Build the identifier for one box.
///
/// ```
/// use chrono::NaiveDate;
/// use warelabel::boxes::box_identifier;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// assert_eq!(box_identifier(date, "Wheat Flour (50kg)", 7), "240315-WHEATFLOUR50-7");
/// ```
pub fn box_identifier(date: NaiveDate, description: &str, box_number: u32) -> String {
    format!(
        "{}-{}-{}",
        date_stamp(date),
        sanitize_description(description),
        box_number
    )
}
