//! HTTP client for the inventory backend.
//!
//! | Method | Path |
//! |--------|------|
//! | GET | `/entries/{company}/{transaction_no}` |
//! | POST | `/entries` |
//! | PUT | `/entries/{company}/{transaction_no}` |
//! | GET | `/skus/resolve?description=..&category=..&sub_category=..&company=..` |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info};

use super::{EntryApi, SkuResolver};
use crate::error::WarelabelError;
use crate::inventory::Entry;

#[derive(Debug, Deserialize)]
struct SkuResponse {
    sku_id: Option<String>,
}

pub struct RemoteEntryApi {
    client: reqwest::Client,
    base_url: Url,
}

impl RemoteEntryApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WarelabelError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| WarelabelError::Config(format!("invalid API base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(WarelabelError::Config(format!(
                "invalid API base URL '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("warelabel/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| WarelabelError::Config(format!("HTTP client error: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Base URL with escaped path segments appended.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send_entry(&self, request: reqwest::RequestBuilder, url: &Url) -> Result<(), WarelabelError> {
        request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| WarelabelError::transport(url.as_str(), e))?;
        Ok(())
    }
}

#[async_trait]
impl EntryApi for RemoteEntryApi {
    async fn get_entry(&self, company: &str, transaction_no: &str) -> Result<Option<Entry>, WarelabelError> {
        let url = self.endpoint(&["entries", company, transaction_no]);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| WarelabelError::transport(url.as_str(), e))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(company, transaction_no, "entry not found");
            return Ok(None);
        }
        let entry = response
            .error_for_status()
            .map_err(|e| WarelabelError::transport(url.as_str(), e))?
            .json::<Entry>()
            .await
            .map_err(|e| WarelabelError::transport(url.as_str(), e))?;
        Ok(Some(entry))
    }

    async fn create_entry(&self, entry: &Entry) -> Result<(), WarelabelError> {
        let url = self.endpoint(&["entries"]);
        self.send_entry(self.client.post(url.clone()).json(entry), &url).await?;
        info!(entry = %entry.reference(), "entry created");
        Ok(())
    }

    async fn update_entry(
        &self,
        company: &str,
        transaction_no: &str,
        entry: &Entry,
    ) -> Result<(), WarelabelError> {
        let url = self.endpoint(&["entries", company, transaction_no]);
        self.send_entry(self.client.put(url.clone()).json(entry), &url).await?;
        info!(entry = %entry.reference(), "entry updated");
        Ok(())
    }
}

#[async_trait]
impl SkuResolver for RemoteEntryApi {
    async fn resolve_sku(
        &self,
        description: &str,
        category: Option<&str>,
        sub_category: Option<&str>,
        company: &str,
    ) -> Result<String, WarelabelError> {
        let resolution = |reason: String| WarelabelError::Resolution {
            description: description.to_string(),
            reason,
        };

        let mut url = self.endpoint(&["skus", "resolve"]);
        url.query_pairs_mut()
            .append_pair("description", description)
            .append_pair("category", category.unwrap_or(""))
            .append_pair("sub_category", sub_category.unwrap_or(""))
            .append_pair("company", company);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| resolution(e.to_string()))?;
        let body: SkuResponse = response.json().await.map_err(|e| resolution(e.to_string()))?;

        body.sku_id
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| resolution("backend returned no SKU".to_string()))
    }
}
