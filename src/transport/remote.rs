//! # Remote Print Backend
//!
//! Prints through an HTTP backend that owns the printers.
//!
//! | Method | Path | Body / Response |
//! |--------|------|-----------------|
//! | GET | `/printers` | `[PrinterInfo]` or `{"printers": [...]}` |
//! | POST | `/jobs` | job request → `{"job_id", "labels_count"}` |
//! | GET | `/jobs/{id}` | `{"status", "progress", "error_message"?}` |
//!
//! Label images travel as base64-encoded PNG.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ChannelKind, PrintChannel, SubmitReceipt, SubmitRequest};
use crate::dispatch::{JobId, JobSnapshot};
use crate::error::WarelabelError;
use crate::printer::{MediaSpec, PrinterInfo};

/// Body of `POST /jobs`.
#[derive(Debug, Serialize)]
pub struct JobRequest<'a> {
    pub transaction_no: &'a str,
    pub company: &'a str,
    pub box_numbers: Vec<u32>,
    pub printer_name: &'a str,
    pub media: &'a MediaSpec,
    /// Base64-encoded PNG, one per box.
    pub images: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PrinterList {
    Bare(Vec<PrinterInfo>),
    Wrapped { printers: Vec<PrinterInfo> },
}

impl From<PrinterList> for Vec<PrinterInfo> {
    fn from(list: PrinterList) -> Self {
        match list {
            PrinterList::Bare(printers) | PrinterList::Wrapped { printers } => printers,
        }
    }
}

pub struct RemoteHttpChannel {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteHttpChannel {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WarelabelError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("warelabel/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| WarelabelError::Config(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, WarelabelError> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| WarelabelError::transport(&url, e))?;
        response
            .json::<T>()
            .await
            .map_err(|e| WarelabelError::transport(&url, e))
    }
}

/// Encode PNG bytes for the job request body.
pub fn encode_images(pngs: &[Vec<u8>]) -> Vec<String> {
    pngs.iter()
        .map(|png| base64::engine::general_purpose::STANDARD.encode(png))
        .collect()
}

#[async_trait]
impl PrintChannel for RemoteHttpChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::RemoteHttp
    }

    async fn list_printers(&self) -> Result<Vec<PrinterInfo>, WarelabelError> {
        let list: PrinterList = self.get_json("/printers").await?;
        Ok(list.into())
    }

    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitReceipt, WarelabelError> {
        let pngs = request.encode_pngs().await?;
        let body = JobRequest {
            transaction_no: &request.transaction_no,
            company: &request.company,
            box_numbers: request.box_numbers(),
            printer_name: &request.printer_name,
            media: &request.media,
            images: encode_images(&pngs),
        };

        let url = self.url("/jobs");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| WarelabelError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WarelabelError::Dispatch {
                printer: request.printer_name.clone(),
                reason: format!("{} {}", status, text.trim()),
            });
        }

        let receipt: SubmitReceipt = response
            .json()
            .await
            .map_err(|e| WarelabelError::transport(&url, e))?;
        info!(job_id = %receipt.job_id, printer = %request.printer_name, labels = receipt.labels_count, "submitted to print backend");
        Ok(receipt)
    }

    async fn poll(&self, job_id: &JobId) -> Result<JobSnapshot, WarelabelError> {
        self.get_json(&format!("/jobs/{}", job_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printer_list_shapes() {
        let bare: PrinterList = serde_json::from_str(r#"[{"name":"Zebra"}]"#).unwrap();
        let wrapped: PrinterList = serde_json::from_str(r#"{"printers":[{"name":"Zebra"}]}"#).unwrap();
        assert_eq!(Vec::<PrinterInfo>::from(bare)[0].name, "Zebra");
        assert_eq!(Vec::<PrinterInfo>::from(wrapped)[0].name, "Zebra");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let channel = RemoteHttpChannel::new("http://print.local/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(channel.url("/jobs"), "http://print.local/api/jobs");
    }

    #[test]
    fn test_job_request_body() {
        let media = MediaSpec::new(4.0, 2.0, 203);
        let body = JobRequest {
            transaction_no: "INW-1",
            company: "ACME",
            box_numbers: vec![1, 2],
            printer_name: "Zebra",
            media: &media,
            images: encode_images(&[vec![0x89, b'P', b'N', b'G']]),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["box_numbers"], serde_json::json!([1, 2]));
        assert_eq!(json["images"][0], "iVBORw==");
        assert_eq!(json["media"]["dpi"], 203);
    }

    #[test]
    fn test_receipt_decoding() {
        let receipt: SubmitReceipt = serde_json::from_str(r#"{"job_id":"job-7","labels_count":3}"#).unwrap();
        assert_eq!(receipt.job_id.as_str(), "job-7");
        assert_eq!(receipt.labels_count, 3);
    }
}
