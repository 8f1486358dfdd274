//! Entries and the boxes derived from their articles.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Article, ArticleId, ArticleSet, parse_date};
use crate::error::{ValidationError, WarelabelError};

/// One physically labelled unit derived from an article.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxRecord {
    /// Deterministic identifier (date stamp, description, box number).
    pub box_id: String,
    /// Sequential number within the entry, starting at 1.
    pub box_number: u32,
    /// Article this box was derived from.
    ///
    /// `None` on records stored before boxes carried their owner; those are
    /// matched to an article by description instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_id: Option<ArticleId>,
    /// Description of the article this box came from. A label, not a key.
    pub article_description: String,
    pub net_weight: f64,
    pub gross_weight: f64,
    pub lot_number: Option<String>,
}

impl BoxRecord {
    /// Whether this box was derived from the article stored under `id`.
    pub fn belongs_to(&self, id: ArticleId, article: &Article) -> bool {
        match self.article_id {
            Some(owner) => owner == id,
            None => self.article_description == article.description,
        }
    }
}

/// Boxes keyed by box number. Numbers are unique by construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoxSet {
    items: BTreeMap<u32, BoxRecord>,
}

impl BoxSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a box, replacing any box with the same number.
    pub fn insert(&mut self, record: BoxRecord) -> Option<BoxRecord> {
        self.items.insert(record.box_number, record)
    }

    pub fn get(&self, box_number: u32) -> Option<&BoxRecord> {
        self.items.get(&box_number)
    }

    pub fn remove(&mut self, box_number: u32) -> Option<BoxRecord> {
        self.items.remove(&box_number)
    }

    /// Box with this number that came from `article` under its current
    /// description. An owner key, when recorded, must match `id` as well.
    pub fn matching(&self, box_number: u32, id: ArticleId, article: &Article) -> Option<&BoxRecord> {
        self.items.get(&box_number).filter(|b| {
            b.article_description == article.description && b.article_id.is_none_or(|owner| owner == id)
        })
    }

    /// Boxes derived from the article stored under `id`.
    pub fn for_article<'a>(&'a self, id: ArticleId, article: &'a Article) -> impl Iterator<Item = &'a BoxRecord> {
        self.items.values().filter(move |b| b.belongs_to(id, article))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoxRecord> {
        self.items.values()
    }

    pub fn numbers(&self) -> Vec<u32> {
        self.items.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl TryFrom<Vec<BoxRecord>> for BoxSet {
    type Error = String;

    fn try_from(records: Vec<BoxRecord>) -> Result<Self, Self::Error> {
        let mut set = Self::new();
        for record in records {
            let number = record.box_number;
            if set.insert(record).is_some() {
                return Err(format!("duplicate box number {}", number));
            }
        }
        Ok(set)
    }
}

impl Serialize for BoxSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.values())
    }
}

impl<'de> Deserialize<'de> for BoxSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<BoxRecord>::deserialize(deserializer)?;
        BoxSet::try_from(records).map_err(serde::de::Error::custom)
    }
}

/// A goods-receipt entry: the transaction that owns articles and boxes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    pub company: String,
    pub transaction_no: String,
    /// Entry date as `YYYY-MM-DD`.
    pub entry_date: String,
    /// Supplier the goods were received from.
    pub vendor: Option<String>,
    /// Party the goods were received on behalf of.
    pub customer: Option<String>,
    pub warehouse: Option<String>,
    pub approval_authority: Option<String>,
    pub articles: ArticleSet,
    pub boxes: BoxSet,
}

impl Entry {
    pub fn new(
        company: impl Into<String>,
        transaction_no: impl Into<String>,
        entry_date: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            transaction_no: transaction_no.into(),
            entry_date: entry_date.into(),
            ..Default::default()
        }
    }

    /// Parsed entry date, or a validation error naming the bad value.
    pub fn parsed_entry_date(&self) -> Result<NaiveDate, WarelabelError> {
        parse_date("entry date", &self.entry_date).map_err(|issue| {
            let mut err = ValidationError::new();
            err.push(issue);
            WarelabelError::Validation(err)
        })
    }

    /// Human-readable reference used in messages and logs.
    pub fn reference(&self) -> String {
        format!("{}/{}", self.company, self.transaction_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u32, desc: &str) -> BoxRecord {
        BoxRecord {
            box_id: format!("ID{}", n),
            box_number: n,
            article_description: desc.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_box_numbers_rejected() {
        let err = BoxSet::try_from(vec![record(1, "a"), record(1, "b")]).unwrap_err();
        assert!(err.contains("duplicate box number 1"));
    }

    #[test]
    fn test_matching_requires_description() {
        let rice = Article::new("Rice", 1, "BOX");
        let wheat = Article::new("Wheat", 1, "BOX");
        let set = BoxSet::try_from(vec![record(1, "Rice")]).unwrap();
        assert!(set.matching(1, ArticleId(0), &rice).is_some());
        assert!(set.matching(1, ArticleId(0), &wheat).is_none());
        assert!(set.matching(2, ArticleId(0), &rice).is_none());
    }

    #[test]
    fn test_matching_respects_owner() {
        let rice = Article::new("Rice", 1, "BOX");
        let set = BoxSet::try_from(vec![BoxRecord {
            article_id: Some(ArticleId(1)),
            ..record(1, "Rice")
        }])
        .unwrap();
        assert!(set.matching(1, ArticleId(1), &rice).is_some());
        assert!(set.matching(1, ArticleId(0), &rice).is_none());
    }

    #[test]
    fn test_owner_id_wins_over_description() {
        let mut articles = ArticleSet::new();
        let first = articles.insert(Article::new("Rice", 1, "BOX"));
        let second = articles.insert(Article::new("Rice", 1, "BOX"));
        let set = BoxSet::try_from(vec![
            BoxRecord {
                article_id: Some(second),
                ..record(1, "Rice")
            },
            record(2, "Rice"),
        ])
        .unwrap();

        let rice = articles.get(first).unwrap();
        let owned: Vec<u32> = set.for_article(first, rice).map(|b| b.box_number).collect();
        assert_eq!(owned, vec![2]);
        let owned: Vec<u32> = set.for_article(second, rice).map(|b| b.box_number).collect();
        assert_eq!(owned, vec![1, 2]);
    }

    #[test]
    fn test_entry_json_round_trip() {
        let mut entry = Entry::new("ACME", "TX-1", "2024-03-15");
        let id = entry.articles.insert(Article::new("Rice", 2, "BOX"));
        entry.boxes.insert(BoxRecord {
            article_id: Some(id),
            ..record(1, "Rice")
        });
        let json = serde_json::to_string(&entry).unwrap();
        let back: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_bad_entry_date() {
        let entry = Entry::new("ACME", "TX-1", "yesterday");
        assert!(matches!(
            entry.parsed_entry_date(),
            Err(WarelabelError::Validation(_))
        ));
    }
}
