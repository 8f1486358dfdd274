//! # Inventory API
//!
//! The persistence and SKU lookup services the label pipeline depends on.
//!
//! - [`EntryApi`]: load, create and update entries
//! - [`SkuResolver`]: map an article to its SKU id
//!
//! [`RemoteEntryApi`] talks to the inventory backend over HTTP and implements
//! both. [`MemoryEntryApi`] and [`SkuTable`] keep everything in process for
//! offline use.

pub mod remote;

pub use remote::RemoteEntryApi;

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::WarelabelError;
use crate::inventory::Entry;

#[async_trait]
pub trait EntryApi: Send + Sync {
    /// `None` when the entry has never been saved.
    async fn get_entry(&self, company: &str, transaction_no: &str) -> Result<Option<Entry>, WarelabelError>;

    async fn create_entry(&self, entry: &Entry) -> Result<(), WarelabelError>;

    async fn update_entry(
        &self,
        company: &str,
        transaction_no: &str,
        entry: &Entry,
    ) -> Result<(), WarelabelError>;
}

#[async_trait]
pub trait SkuResolver: Send + Sync {
    async fn resolve_sku(
        &self,
        description: &str,
        category: Option<&str>,
        sub_category: Option<&str>,
        company: &str,
    ) -> Result<String, WarelabelError>;
}

/// Entries held in process, keyed by company and transaction number.
#[derive(Default)]
pub struct MemoryEntryApi {
    entries: RwLock<HashMap<(String, String), Entry>>,
}

impl MemoryEntryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

fn key(company: &str, transaction_no: &str) -> (String, String) {
    (company.to_string(), transaction_no.to_string())
}

#[async_trait]
impl EntryApi for MemoryEntryApi {
    async fn get_entry(&self, company: &str, transaction_no: &str) -> Result<Option<Entry>, WarelabelError> {
        Ok(self.entries.read().await.get(&key(company, transaction_no)).cloned())
    }

    async fn create_entry(&self, entry: &Entry) -> Result<(), WarelabelError> {
        let mut entries = self.entries.write().await;
        let k = key(&entry.company, &entry.transaction_no);
        if entries.contains_key(&k) {
            return Err(WarelabelError::Precondition(format!(
                "Entry {} already exists",
                entry.reference()
            )));
        }
        entries.insert(k, entry.clone());
        Ok(())
    }

    async fn update_entry(
        &self,
        company: &str,
        transaction_no: &str,
        entry: &Entry,
    ) -> Result<(), WarelabelError> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&key(company, transaction_no)) {
            Some(stored) => {
                *stored = entry.clone();
                Ok(())
            }
            None => Err(WarelabelError::NotFound(format!("entry {}/{}", company, transaction_no))),
        }
    }
}

/// Fixed description → SKU mapping.
#[derive(Debug, Clone, Default)]
pub struct SkuTable {
    skus: HashMap<String, String>,
}

impl SkuTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, description: &str, sku_id: &str) -> Self {
        self.skus
            .insert(description.trim().to_lowercase(), sku_id.to_string());
        self
    }
}

#[async_trait]
impl SkuResolver for SkuTable {
    async fn resolve_sku(
        &self,
        description: &str,
        _category: Option<&str>,
        _sub_category: Option<&str>,
        _company: &str,
    ) -> Result<String, WarelabelError> {
        self.skus
            .get(&description.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| WarelabelError::Resolution {
                description: description.to_string(),
                reason: "no SKU registered for this item".to_string(),
            })
    }
}
