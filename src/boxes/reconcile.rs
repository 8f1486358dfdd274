//! Weight reconciliation between boxes and their article aggregates.

use serde::Serialize;

use crate::error::{FieldIssue, ValidationError};
use crate::inventory::{ArticleSet, BoxSet};

/// Tolerance when comparing summed box weights with an aggregate.
pub const WEIGHT_EPSILON: f64 = 0.01;

/// Summed box weight that disagrees with the article aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightMismatch {
    pub description: String,
    /// "net" or "gross".
    pub kind: &'static str,
    pub expected: f64,
    pub actual: f64,
}

impl WeightMismatch {
    pub fn to_issue(&self) -> FieldIssue {
        FieldIssue::WeightMismatch {
            description: self.description.clone(),
            kind: self.kind,
            expected: self.expected,
            actual: self.actual,
        }
    }
}

impl std::fmt::Display for WeightMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_issue())
    }
}

/// Compare box sums with article aggregates for every boxed article.
///
/// Articles without a box-like unit of measure are ignored.
pub fn reconcile(articles: &ArticleSet, boxes: &BoxSet) -> Vec<WeightMismatch> {
    let mut mismatches = Vec::new();

    for (id, article) in articles.iter().filter(|(_, a)| a.is_boxed()) {
        let (net, gross) = boxes
            .for_article(id, article)
            .fold((0.0, 0.0), |(n, g), b| (n + b.net_weight, g + b.gross_weight));

        if (net - article.net_weight).abs() > WEIGHT_EPSILON {
            mismatches.push(WeightMismatch {
                description: article.description.clone(),
                kind: "net",
                expected: article.net_weight,
                actual: net,
            });
        }
        if (gross - article.total_weight).abs() > WEIGHT_EPSILON {
            mismatches.push(WeightMismatch {
                description: article.description.clone(),
                kind: "gross",
                expected: article.total_weight,
                actual: gross,
            });
        }
    }

    mismatches
}

/// Turn mismatches into a hard validation error.
pub fn require_reconciled(articles: &ArticleSet, boxes: &BoxSet) -> Result<(), ValidationError> {
    let mut err = ValidationError::new();
    for mismatch in reconcile(articles, boxes) {
        err.push(mismatch.to_issue());
    }
    err.into_result()
}
