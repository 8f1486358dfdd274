//! Label payload: the fully resolved data printed on one label.
//!
//! ## Compaction
//!
//! The payload is embedded in the label's QR code. To keep the code
//! scannable at label size, field names are replaced by one- or two-letter
//! keys and empty fields are dropped:
//!
//! | Field | Key | Field | Key |
//! |-------|-----|-------|-----|
//! | company | `co` | net_weight | `nw` |
//! | transaction_no | `tx` | gross_weight | `gw` |
//! | entry_date | `dt` | lot_number | `lt` |
//! | box_number | `bx` | batch_number | `bt` |
//! | box_id | `id` | manufacturing_date | `md` |
//! | description | `ds` | expiry_date | `ed` |
//! | sku_id | `sk` | vendor | `vn` |
//! | category | `ct` | customer | `cu` |
//! | sub_category | `sc` | warehouse | `wh` |
//! | approval_authority | `ap` | | |
//!
//! [`decompact`] reverses the mapping; unknown keys are ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FieldIssue, ValidationError, WarelabelError};
use crate::inventory::{Article, BoxRecord, Entry, non_blank, parse_date};

/// Full field name → compact key.
const FIELD_KEYS: &[(&str, &str)] = &[
    ("company", "co"),
    ("transaction_no", "tx"),
    ("entry_date", "dt"),
    ("box_number", "bx"),
    ("box_id", "id"),
    ("description", "ds"),
    ("sku_id", "sk"),
    ("category", "ct"),
    ("sub_category", "sc"),
    ("net_weight", "nw"),
    ("gross_weight", "gw"),
    ("lot_number", "lt"),
    ("batch_number", "bt"),
    ("manufacturing_date", "md"),
    ("expiry_date", "ed"),
    ("vendor", "vn"),
    ("customer", "cu"),
    ("warehouse", "wh"),
    ("approval_authority", "ap"),
];

/// One box, its article and the entry's shared fields, resolved for printing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelPayload {
    pub company: String,
    pub transaction_no: String,
    pub entry_date: String,
    /// 0 means "not set".
    pub box_number: u32,
    pub box_id: Option<String>,
    pub description: String,
    pub sku_id: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub net_weight: f64,
    pub gross_weight: f64,
    pub lot_number: Option<String>,
    pub batch_number: Option<String>,
    pub manufacturing_date: Option<String>,
    pub expiry_date: Option<String>,
    pub vendor: Option<String>,
    pub customer: Option<String>,
    pub warehouse: Option<String>,
    pub approval_authority: Option<String>,
}

fn owned(value: &str) -> Option<String> {
    non_blank(Some(value)).map(str::to_string)
}

impl LabelPayload {
    /// Project one box with its article and entry.
    pub fn resolve(entry: &Entry, record: &BoxRecord, article: &Article) -> Self {
        Self {
            company: entry.company.clone(),
            transaction_no: entry.transaction_no.clone(),
            entry_date: entry.entry_date.clone(),
            box_number: record.box_number,
            box_id: owned(&record.box_id),
            description: article.description.clone(),
            sku_id: article.sku_id.clone(),
            category: owned(&article.category),
            sub_category: owned(&article.sub_category),
            net_weight: record.net_weight,
            gross_weight: record.gross_weight,
            lot_number: record.lot_number.clone().or_else(|| article.lot_number.clone()),
            batch_number: article.batch_number.clone(),
            manufacturing_date: article.manufacturing_date.clone(),
            expiry_date: article.expiry_date.clone(),
            vendor: entry.vendor.clone(),
            customer: entry.customer.clone(),
            warehouse: entry.warehouse.clone(),
            approval_authority: entry.approval_authority.clone(),
        }
    }

    /// Collect every missing mandatory field and every malformed date.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new();

        if self.company.trim().is_empty() {
            err.push(FieldIssue::Missing("company"));
        }
        if self.transaction_no.trim().is_empty() {
            err.push(FieldIssue::Missing("transaction number"));
        }
        if self.box_number == 0 {
            err.push(FieldIssue::Missing("box number"));
        }
        if self.description.trim().is_empty() {
            err.push(FieldIssue::Missing("item description"));
        }
        if self.entry_date.trim().is_empty() {
            err.push(FieldIssue::Missing("entry date"));
        } else if let Err(issue) = parse_date("entry date", &self.entry_date) {
            err.push(issue);
        }

        for (field, value) in [
            ("manufacturing date", &self.manufacturing_date),
            ("expiry date", &self.expiry_date),
        ] {
            if let Some(value) = non_blank(value.as_deref())
                && let Err(issue) = parse_date(field, value)
            {
                err.push(issue);
            }
        }

        err.into_result()
    }

    /// The payload with blank optional fields cleared and blank required
    /// fields emptied, i.e. what survives a compaction round trip.
    pub fn normalized(&self) -> Self {
        let opt = |v: &Option<String>| v.as_deref().and_then(owned);
        let req = |v: &str| owned(v).unwrap_or_default();
        Self {
            company: req(&self.company),
            transaction_no: req(&self.transaction_no),
            entry_date: req(&self.entry_date),
            box_number: self.box_number,
            box_id: opt(&self.box_id),
            description: req(&self.description),
            sku_id: opt(&self.sku_id),
            category: opt(&self.category),
            sub_category: opt(&self.sub_category),
            net_weight: self.net_weight,
            gross_weight: self.gross_weight,
            lot_number: opt(&self.lot_number),
            batch_number: opt(&self.batch_number),
            manufacturing_date: opt(&self.manufacturing_date),
            expiry_date: opt(&self.expiry_date),
            vendor: opt(&self.vendor),
            customer: opt(&self.customer),
            warehouse: opt(&self.warehouse),
            approval_authority: opt(&self.approval_authority),
        }
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Short-key dictionary for embedding.
pub fn compact(payload: &LabelPayload) -> Result<Map<String, Value>, WarelabelError> {
    let normalized = payload.normalized();
    let full = match serde_json::to_value(&normalized) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(WarelabelError::Render("payload is not an object".to_string())),
        Err(e) => return Err(WarelabelError::Render(format!("payload encode failed: {}", e))),
    };

    let mut short = Map::new();
    for (name, key) in FIELD_KEYS {
        if let Some(value) = full.get(*name)
            && !is_empty_value(value)
        {
            short.insert((*key).to_string(), value.clone());
        }
    }
    Ok(short)
}

/// Compact JSON text embedded in the QR code.
pub fn compact_json(payload: &LabelPayload) -> Result<String, WarelabelError> {
    let map = compact(payload)?;
    serde_json::to_string(&map).map_err(|e| WarelabelError::Render(format!("payload encode failed: {}", e)))
}

/// Expand a short-key dictionary back into a payload.
pub fn decompact(map: &Map<String, Value>) -> Result<LabelPayload, WarelabelError> {
    let mut full = Map::new();
    for (name, key) in FIELD_KEYS {
        if let Some(value) = map.get(*key) {
            full.insert((*name).to_string(), value.clone());
        }
    }
    serde_json::from_value(Value::Object(full))
        .map_err(|e| WarelabelError::Render(format!("payload decode failed: {}", e)))
}

/// Parse scanned QR text back into a payload.
pub fn decompact_json(text: &str) -> Result<LabelPayload, WarelabelError> {
    let map: Map<String, Value> = serde_json::from_str(text)
        .map_err(|e| WarelabelError::Render(format!("payload decode failed: {}", e)))?;
    decompact(&map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> LabelPayload {
        LabelPayload {
            company: "ACME Foods".to_string(),
            transaction_no: "INW-2024-0042".to_string(),
            entry_date: "2024-03-15".to_string(),
            box_number: 2,
            box_id: Some("240315-WHEATFLOUR-2".to_string()),
            description: "Wheat Flour".to_string(),
            sku_id: Some("SKU-77".to_string()),
            category: Some("Grains".to_string()),
            sub_category: None,
            net_weight: 10.0,
            gross_weight: 11.0,
            lot_number: Some("L1".to_string()),
            batch_number: Some("".to_string()),
            manufacturing_date: Some("2024-03-01".to_string()),
            expiry_date: Some("2025-03-01".to_string()),
            vendor: Some("Mill Co".to_string()),
            customer: None,
            warehouse: Some("   ".to_string()),
            approval_authority: Some("R. Singh".to_string()),
        }
    }

    #[test]
    fn test_compact_uses_short_keys_and_drops_empty() {
        let map = compact(&sample()).unwrap();
        assert_eq!(map.get("co"), Some(&Value::String("ACME Foods".into())));
        assert_eq!(map.get("bx"), Some(&Value::from(2)));
        assert!(!map.contains_key("bt"));
        assert!(!map.contains_key("wh"));
        assert!(!map.contains_key("sc"));
        assert!(map.keys().all(|k| k.len() <= 2));
    }

    #[test]
    fn test_round_trip_restricted_to_non_empty() {
        let payload = sample();
        let back = decompact(&compact(&payload).unwrap()).unwrap();
        assert_eq!(back, payload.normalized());
        assert_eq!(back.batch_number, None);
        assert_eq!(back.warehouse, None);
        assert_eq!(back.vendor, payload.vendor);
    }

    #[test]
    fn test_json_round_trip() {
        let payload = sample();
        let text = compact_json(&payload).unwrap();
        assert!(text.len() < serde_json::to_string(&payload).unwrap().len());
        assert_eq!(decompact_json(&text).unwrap(), payload.normalized());
    }

    #[test]
    fn test_decompact_ignores_unknown_keys() {
        let text = r#"{"co":"X","zz":1}"#;
        let payload = decompact_json(text).unwrap();
        assert_eq!(payload.company, "X");
    }

    #[test]
    fn test_validate_lists_every_missing_field() {
        let err = LabelPayload::default().validate().unwrap_err();
        assert_eq!(
            err.missing_fields(),
            vec![
                "company",
                "transaction number",
                "box number",
                "item description",
                "entry date"
            ]
        );
    }

    #[test]
    fn test_validate_malformed_dates() {
        let mut payload = sample();
        payload.entry_date = "15.03.2024".to_string();
        payload.expiry_date = Some("soon".to_string());
        let err = payload.validate().unwrap_err();
        assert_eq!(err.issues.len(), 2);
        assert!(err.missing_fields().is_empty());
    }

    #[test]
    fn test_valid_sample() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_resolve_from_entry() {
        let mut entry = Entry::new("ACME", "TX-9", "2024-01-01");
        entry.vendor = Some("Mill".to_string());
        let mut article = Article::new("Rice", 1, "BOX").category("Grains", "");
        article.lot_number = Some("LOT-A".to_string());
        let record = BoxRecord {
            box_id: "240101-RICE-1".to_string(),
            box_number: 1,
            article_id: None,
            article_description: "Rice".to_string(),
            net_weight: 5.0,
            gross_weight: 5.5,
            lot_number: None,
        };
        let payload = LabelPayload::resolve(&entry, &record, &article);
        assert_eq!(payload.lot_number.as_deref(), Some("LOT-A"));
        assert_eq!(payload.sub_category, None);
        assert_eq!(payload.vendor.as_deref(), Some("Mill"));
        assert_eq!(payload.gross_weight, 5.5);
    }
}
