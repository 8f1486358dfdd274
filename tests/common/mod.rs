//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use warelabel::api::{MemoryEntryApi, SkuTable};
use warelabel::config::ClientConfig;
use warelabel::dispatch::{Dispatcher, JobId, JobSnapshot, JobStatus, PollPolicy};
use warelabel::error::WarelabelError;
use warelabel::inventory::{Article, Entry};
use warelabel::printer::{PrinterInfo, PrinterStatus};
use warelabel::service::LabelService;
use warelabel::transport::{ChannelKind, PrintChannel, SubmitReceipt, SubmitRequest};

/// A print channel whose answers are fixed up front and whose calls are counted.
pub struct ScriptedChannel {
    /// Submissions containing any of these boxes are rejected.
    pub reject_boxes: Vec<u32>,
    /// Status every poll reports.
    pub poll_status: JobStatus,
    pub printers: Vec<PrinterInfo>,
    pub submits: AtomicUsize,
    pub polls: AtomicUsize,
    pub lists: AtomicUsize,
    /// Box numbers in submission order, rejected ones included.
    pub submitted: Mutex<Vec<u32>>,
}

impl ScriptedChannel {
    pub fn completing() -> Self {
        Self {
            reject_boxes: Vec::new(),
            poll_status: JobStatus::Completed,
            printers: vec![zebra()],
            submits: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn stuck_queued() -> Self {
        Self {
            poll_status: JobStatus::Queued,
            ..Self::completing()
        }
    }

    pub fn rejecting(boxes: &[u32]) -> Self {
        Self {
            reject_boxes: boxes.to_vec(),
            ..Self::completing()
        }
    }

    /// Every call that reached the channel.
    pub fn calls(&self) -> usize {
        self.submits.load(Ordering::SeqCst) + self.polls.load(Ordering::SeqCst) + self.lists.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<u32> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl PrintChannel for ScriptedChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::RemoteHttp
    }

    async fn list_printers(&self) -> Result<Vec<PrinterInfo>, WarelabelError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        Ok(self.printers.clone())
    }

    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitReceipt, WarelabelError> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst) + 1;
        let boxes = request.box_numbers();
        self.submitted.lock().unwrap().extend(&boxes);

        if boxes.iter().any(|b| self.reject_boxes.contains(b)) {
            return Err(WarelabelError::Dispatch {
                printer: request.printer_name.clone(),
                reason: "paper jam".to_string(),
            });
        }
        Ok(SubmitReceipt {
            job_id: JobId(format!("{}-{}", request.printer_name, n)),
            labels_count: boxes.len() as u32,
        })
    }

    async fn poll(&self, _job_id: &JobId) -> Result<JobSnapshot, WarelabelError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let progress = if self.poll_status == JobStatus::Completed { 100 } else { 0 };
        Ok(JobSnapshot::new(self.poll_status, progress))
    }
}

pub fn zebra() -> PrinterInfo {
    PrinterInfo {
        name: "Zebra".to_string(),
        status: PrinterStatus::Online,
        supports_label_printing: true,
        max_media_width_in: Some(4.0),
        dpi: Some(203),
        ..Default::default()
    }
}

pub fn poll_policy() -> PollPolicy {
    PollPolicy::fixed(Duration::from_secs(2), 30)
}

pub fn wheat_flour() -> Article {
    Article::new("Wheat Flour", 3, "BOX").weights(30.0, 33.0)
}

pub fn entry_with(articles: Vec<Article>) -> Entry {
    let mut entry = Entry::new("ACME Foods", "INW-2024-0042", "2024-03-15");
    entry.warehouse = Some("WH-1".to_string());
    for article in articles {
        entry.articles.insert(article);
    }
    entry
}

/// Service over an in-memory inventory and the given channel.
pub fn service(channel: Arc<ScriptedChannel>, config: ClientConfig) -> (LabelService, Arc<MemoryEntryApi>) {
    let entries = Arc::new(MemoryEntryApi::new());
    let skus = Arc::new(
        SkuTable::new()
            .with("Wheat Flour", "SKU-77")
            .with("Basmati Rice", "SKU-12"),
    );
    let dispatcher = Dispatcher::new(channel, config.poll.clone());
    (LabelService::new(entries.clone(), skus, dispatcher, config), entries)
}

pub fn fast_config() -> ClientConfig {
    ClientConfig {
        poll: poll_policy(),
        batch_delay_ms: 500,
        ..Default::default()
    }
}
