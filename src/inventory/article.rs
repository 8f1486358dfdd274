//! Articles: the line items of a receipt.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::BoxRecord;

/// Units of measure that produce physical boxes.
const BOX_LIKE_UOMS: &[&str] = &["BOX", "CARTON"];

/// A line item describing one item type with aggregate quantity and weight.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    pub description: String,
    pub category: String,
    pub sub_category: String,
    /// Resolved SKU identifier, `None` until looked up.
    pub sku_id: Option<String>,
    /// Quantity in whole units.
    pub quantity: u32,
    /// Unit of measure (e.g. "BOX", "CARTON", "KG").
    pub uom: String,
    /// Aggregate net weight across all units.
    pub net_weight: f64,
    /// Aggregate gross weight across all units.
    pub total_weight: f64,
    pub batch_number: Option<String>,
    pub lot_number: Option<String>,
    pub manufacturing_date: Option<String>,
    pub expiry_date: Option<String>,
    pub unit_rate: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
}

impl Article {
    /// Create an article with the fields that drive box derivation.
    pub fn new(description: impl Into<String>, quantity: u32, uom: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            quantity,
            uom: uom.into(),
            ..Default::default()
        }
    }

    /// Set aggregate net and gross weight.
    pub fn weights(mut self, net: f64, gross: f64) -> Self {
        self.net_weight = net;
        self.total_weight = gross;
        self
    }

    /// Set category and sub-category.
    pub fn category(mut self, category: impl Into<String>, sub_category: impl Into<String>) -> Self {
        self.category = category.into();
        self.sub_category = sub_category.into();
        self
    }

    /// Whether this article's unit of measure yields physical boxes.
    pub fn is_boxed(&self) -> bool {
        let uom = self.uom.trim();
        BOX_LIKE_UOMS.iter().any(|u| uom.eq_ignore_ascii_case(u))
    }

    /// Line value after tax and discount.
    pub fn line_total(&self) -> f64 {
        self.unit_rate * self.quantity as f64 + self.tax_amount - self.discount_amount
    }
}

/// Stable key for an article within one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArticleId(pub u32);

/// Articles keyed by [`ArticleId`], iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ArticleSet {
    items: BTreeMap<ArticleId, Article>,
    next_id: u32,
}

impl ArticleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an article, returning its key.
    pub fn insert(&mut self, article: Article) -> ArticleId {
        let id = ArticleId(self.next_id);
        self.next_id += 1;
        self.items.insert(id, article);
        id
    }

    pub fn get(&self, id: ArticleId) -> Option<&Article> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: ArticleId) -> Option<&mut Article> {
        self.items.get_mut(&id)
    }

    /// Remove an article. Keys of the remaining articles are unchanged.
    pub fn remove(&mut self, id: ArticleId) -> Option<Article> {
        self.items.remove(&id)
    }

    /// First article whose description matches exactly.
    pub fn find_by_description(&self, description: &str) -> Option<(ArticleId, &Article)> {
        self.items
            .iter()
            .find(|(_, a)| a.description == description)
            .map(|(id, a)| (*id, a))
    }

    /// The article a box was derived from.
    ///
    /// Uses the box's owner key; records without one fall back to the first
    /// article with the same description.
    pub fn owner_of(&self, record: &BoxRecord) -> Option<(ArticleId, &Article)> {
        match record.article_id {
            Some(id) => self.get(id).map(|article| (id, article)),
            None => self.find_by_description(&record.article_description),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArticleId, &Article)> {
        self.items.iter().map(|(id, a)| (*id, a))
    }

    pub fn values(&self) -> impl Iterator<Item = &Article> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PartialEq for ArticleSet {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl FromIterator<Article> for ArticleSet {
    fn from_iter<I: IntoIterator<Item = Article>>(iter: I) -> Self {
        let mut set = Self::new();
        for article in iter {
            set.insert(article);
        }
        set
    }
}

/// Wire form of one article: its fields plus the key boxes refer to.
#[derive(Serialize)]
struct KeyedRef<'a> {
    id: ArticleId,
    #[serde(flatten)]
    article: &'a Article,
}

#[derive(Deserialize)]
struct Keyed {
    id: Option<ArticleId>,
    #[serde(flatten)]
    article: Article,
}

impl Serialize for ArticleSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.iter().map(|(id, article)| KeyedRef { id: *id, article }))
    }
}

impl<'de> Deserialize<'de> for ArticleSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let keyed = Vec::<Keyed>::deserialize(deserializer)?;

        // Articles without a key are appended after the highest given one.
        let mut set = Self {
            items: BTreeMap::new(),
            next_id: keyed
                .iter()
                .filter_map(|k| k.id)
                .map(|id| id.0.saturating_add(1))
                .max()
                .unwrap_or(0),
        };
        for Keyed { id, article } in keyed {
            match id {
                Some(id) => {
                    if set.items.insert(id, article).is_some() {
                        return Err(serde::de::Error::custom(format!("duplicate article id {}", id.0)));
                    }
                }
                None => {
                    set.insert(article);
                }
            }
        }
        Ok(set)
    }
}
