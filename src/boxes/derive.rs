//! Box derivation, removal and manual weight overrides.

use chrono::NaiveDate;

use super::ident::box_identifier;
use crate::error::{FieldIssue, ValidationError, WarelabelError};
use crate::inventory::{Article, ArticleId, ArticleSet, BoxRecord, BoxSet};

/// Per-unit share of an aggregate, 0 when either side is 0.
fn per_box(aggregate: f64, quantity: u32) -> f64 {
    if quantity == 0 || aggregate == 0.0 {
        0.0
    } else {
        aggregate / quantity as f64
    }
}

/// Derive the full box set for an entry.
///
/// `existing` is the box set as the user last saw it. Boxes that still match
/// on (box number, owning article, article description) keep their stored weights and lot
/// number; all other boxes get fresh defaults. Every box records the key of
/// the article it came from.
pub fn derive_boxes(entry_date: NaiveDate, articles: &ArticleSet, existing: &BoxSet) -> BoxSet {
    let mut boxes = BoxSet::new();
    let mut counter: u32 = 0;

    for (id, article) in articles.iter() {
        if !article.is_boxed() || article.quantity == 0 {
            continue;
        }

        for _ in 0..article.quantity {
            counter += 1;
            boxes.insert(derive_one(entry_date, id, article, counter, existing));
        }
    }

    boxes
}

fn derive_one(
    entry_date: NaiveDate,
    id: ArticleId,
    article: &Article,
    box_number: u32,
    existing: &BoxSet,
) -> BoxRecord {
    let box_id = box_identifier(entry_date, &article.description, box_number);

    match existing.matching(box_number, id, article) {
        Some(previous) => BoxRecord {
            box_id,
            box_number,
            article_id: Some(id),
            article_description: article.description.clone(),
            net_weight: previous.net_weight,
            gross_weight: previous.gross_weight,
            lot_number: previous
                .lot_number
                .clone()
                .or_else(|| article.lot_number.clone()),
        },
        None => BoxRecord {
            box_id,
            box_number,
            article_id: Some(id),
            article_description: article.description.clone(),
            net_weight: per_box(article.net_weight, article.quantity),
            gross_weight: per_box(article.total_weight, article.quantity),
            lot_number: article.lot_number.clone(),
        },
    }
}

/// Remove one box and decrement its article's quantity by one (never below 0).
///
/// Returns the new article and box sets; the inputs are left untouched.
/// Remaining boxes keep their numbers, so numbering may have gaps afterwards.
pub fn remove_box(
    articles: &ArticleSet,
    boxes: &BoxSet,
    box_number: u32,
) -> Result<(ArticleSet, BoxSet), WarelabelError> {
    let mut next_boxes = boxes.clone();
    let removed = next_boxes
        .remove(box_number)
        .ok_or_else(|| WarelabelError::NotFound(format!("box {}", box_number)))?;

    let mut next_articles = articles.clone();
    if let Some((id, _)) = articles.owner_of(&removed)
        && let Some(article) = next_articles.get_mut(id)
    {
        article.quantity = article.quantity.saturating_sub(1);
    }

    Ok((next_articles, next_boxes))
}

/// Manually set one box's weights.
pub fn override_box_weights(
    boxes: &BoxSet,
    box_number: u32,
    net_weight: f64,
    gross_weight: f64,
) -> Result<BoxSet, WarelabelError> {
    let mut issues = ValidationError::new();
    if !(net_weight >= 0.0 && net_weight.is_finite()) {
        issues.push(FieldIssue::OutOfRange {
            field: "net weight",
            value: net_weight,
        });
    }
    if !(gross_weight >= 0.0 && gross_weight.is_finite()) {
        issues.push(FieldIssue::OutOfRange {
            field: "gross weight",
            value: gross_weight,
        });
    }
    issues.into_result()?;

    let mut next = boxes.clone();
    let record = boxes
        .get(box_number)
        .ok_or_else(|| WarelabelError::NotFound(format!("box {}", box_number)))?;
    next.insert(BoxRecord {
        net_weight,
        gross_weight,
        ..record.clone()
    });
    Ok(next)
}
