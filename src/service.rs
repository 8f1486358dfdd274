//! # Label Service
//!
//! The operations the entry form calls: derive and edit boxes, save the
//! entry, preview a label, print one box or every box.
//!
//! ## Print Flow
//!
//! ```text
//! resolve printer ─→ weight check ─→ entry saved? (get, else create)
//!        ─→ SKU per article ─→ render ─→ dispatch ─→ poll
//! ```
//!
//! Printer and weight checks run first, so a missing printer costs no
//! network calls. The entry is persisted before any label is rendered.
//!
//! Session state ([`PrintSession`], [`PrinterCatalog`]) belongs to the
//! caller and is passed into each call.

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::api::{EntryApi, SkuResolver};
use crate::boxes::{WeightMismatch, derive_boxes, override_box_weights, reconcile, remove_box};
use crate::config::ClientConfig;
use crate::dispatch::{BatchReport, BoxOutcome, BoxPrintResult, Dispatcher, JobContext, JobOutcome};
use crate::error::{ValidationError, WarelabelError};
use crate::inventory::{Article, ArticleId, BoxRecord, Entry};
use crate::label::{LabelImage, LabelPayload, LabelSpec, render_label};
use crate::printer::{PrintSession, PrinterCatalog, PrinterInfo, discover};

/// Success flag plus a message for the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Result of printing a single box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintedBox {
    pub printer: String,
    #[serde(flatten)]
    pub result: BoxPrintResult,
}

impl PrintedBox {
    pub fn message(&self) -> String {
        self.result.message(&self.printer)
    }
}

/// An entry after saving, with any weight disagreements that were tolerated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedEntry {
    pub created: bool,
    pub warnings: Vec<WeightMismatch>,
}

pub struct LabelService {
    entries: Arc<dyn EntryApi>,
    skus: Arc<dyn SkuResolver>,
    dispatcher: Dispatcher,
    config: ClientConfig,
}

impl LabelService {
    pub fn new(
        entries: Arc<dyn EntryApi>,
        skus: Arc<dyn SkuResolver>,
        dispatcher: Dispatcher,
        config: ClientConfig,
    ) -> Self {
        Self {
            entries,
            skus,
            dispatcher,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// A fresh session printing on the configured label media.
    pub fn new_session(&self) -> PrintSession {
        PrintSession::new(self.config.media())
    }

    pub async fn printers(&self) -> PrinterCatalog {
        discover(self.dispatcher.channel().as_ref(), self.config.discovery_timeout()).await
    }

    /// Re-derive the entry's boxes from its articles.
    pub fn derive(&self, entry: &Entry) -> Result<Entry, WarelabelError> {
        let date = entry.parsed_entry_date()?;
        let mut next = entry.clone();
        next.boxes = derive_boxes(date, &entry.articles, &entry.boxes);
        info!(entry = %entry.reference(), boxes = next.boxes.len(), "boxes derived");
        Ok(next)
    }

    pub fn remove(&self, entry: &Entry, box_number: u32) -> Result<Entry, WarelabelError> {
        let (articles, boxes) = remove_box(&entry.articles, &entry.boxes, box_number)?;
        let mut next = entry.clone();
        next.articles = articles;
        next.boxes = boxes;
        Ok(next)
    }

    pub fn override_weights(
        &self,
        entry: &Entry,
        box_number: u32,
        net_weight: f64,
        gross_weight: f64,
    ) -> Result<Entry, WarelabelError> {
        let mut next = entry.clone();
        next.boxes = override_box_weights(&entry.boxes, box_number, net_weight, gross_weight)?;
        Ok(next)
    }

    /// Box/article weight disagreements; an error when enforcement is on.
    pub fn check_weights(&self, entry: &Entry) -> Result<Vec<WeightMismatch>, WarelabelError> {
        let mismatches = reconcile(&entry.articles, &entry.boxes);
        if mismatches.is_empty() {
            return Ok(mismatches);
        }
        if self.config.enforce_weight_reconciliation {
            let mut err = ValidationError::new();
            for m in &mismatches {
                err.push(m.to_issue());
            }
            return Err(err.into());
        }
        for m in &mismatches {
            warn!(entry = %entry.reference(), "{}", m);
        }
        Ok(mismatches)
    }

    /// Create or update the entry on the backend.
    pub async fn save_entry(&self, entry: &Entry) -> Result<SavedEntry, WarelabelError> {
        let warnings = self.check_weights(entry)?;
        let created = match self.entries.get_entry(&entry.company, &entry.transaction_no).await? {
            Some(_) => {
                self.entries
                    .update_entry(&entry.company, &entry.transaction_no, entry)
                    .await?;
                false
            }
            None => {
                self.entries.create_entry(entry).await?;
                true
            }
        };
        Ok(SavedEntry { created, warnings })
    }

    /// Make sure the entry exists on the backend; never overwrites it.
    async fn ensure_persisted(&self, entry: &Entry) -> Result<(), WarelabelError> {
        if self
            .entries
            .get_entry(&entry.company, &entry.transaction_no)
            .await?
            .is_none()
        {
            self.entries.create_entry(entry).await?;
            info!(entry = %entry.reference(), "entry saved before printing");
        }
        Ok(())
    }

    fn box_and_article(
        entry: &Entry,
        box_number: u32,
    ) -> Result<(&BoxRecord, ArticleId, &Article), WarelabelError> {
        let record = entry
            .boxes
            .get(box_number)
            .ok_or_else(|| WarelabelError::NotFound(format!("box {}", box_number)))?;
        let (id, article) = entry.articles.owner_of(record).ok_or_else(|| {
            WarelabelError::NotFound(format!(
                "article '{}' for box {}",
                record.article_description, box_number
            ))
        })?;
        Ok((record, id, article))
    }

    /// The article with its SKU filled in.
    async fn with_sku(&self, entry: &Entry, article: &Article) -> Result<Article, WarelabelError> {
        let mut resolved = article.clone();
        if resolved.sku_id.as_deref().is_some_and(|s| !s.trim().is_empty()) {
            return Ok(resolved);
        }
        let sku = self
            .skus
            .resolve_sku(
                &article.description,
                Some(article.category.as_str()).filter(|s| !s.is_empty()),
                Some(article.sub_category.as_str()).filter(|s| !s.is_empty()),
                &entry.company,
            )
            .await?;
        resolved.sku_id = Some(sku);
        Ok(resolved)
    }

    fn spec_for(&self, printer: Option<&PrinterInfo>) -> LabelSpec {
        match printer.and_then(|p| p.dpi) {
            Some(dpi) => self.config.label.with_dpi(dpi),
            None => self.config.label,
        }
    }

    fn job_context(entry: &Entry, spec: &LabelSpec) -> JobContext {
        JobContext {
            company: entry.company.clone(),
            transaction_no: entry.transaction_no.clone(),
            media: spec.into(),
        }
    }

    /// Render one box without printing. An unresolvable SKU is left off.
    pub async fn preview(&self, entry: &Entry, box_number: u32) -> Result<LabelImage, WarelabelError> {
        let (record, _, article) = Self::box_and_article(entry, box_number)?;
        let article = match self.with_sku(entry, article).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(box_number, error = %e, "previewing without SKU");
                article.clone()
            }
        };
        let payload = LabelPayload::resolve(entry, record, &article);
        let spec = self.config.label;
        tokio::task::spawn_blocking(move || render_label(&payload, &spec))
            .await
            .map_err(|e| WarelabelError::Render(format!("render task failed: {}", e)))?
    }

    /// Print a single box and wait for the job to finish.
    pub async fn print_box(
        &self,
        session: &PrintSession,
        catalog: &PrinterCatalog,
        entry: &Entry,
        box_number: u32,
    ) -> Result<PrintedBox, WarelabelError> {
        let printer = session.resolve_printer(catalog)?;
        let (record, _, article) = Self::box_and_article(entry, box_number)?;
        self.check_weights(entry)?;
        self.ensure_persisted(entry).await?;

        let article = self.with_sku(entry, article).await?;
        let payload = LabelPayload::resolve(entry, record, &article);
        let spec = self.spec_for(Some(printer));
        let image = tokio::task::spawn_blocking(move || render_label(&payload, &spec))
            .await
            .map_err(|e| WarelabelError::Render(format!("render task failed: {}", e)))??;

        let context = Self::job_context(entry, &spec);
        let (job_id, outcome) = self.dispatcher.print_one(&context, &printer.name, image).await?;
        let outcome = match outcome {
            JobOutcome::Completed => BoxOutcome::Printed { job_id },
            JobOutcome::Failed { reason } => {
                return Err(WarelabelError::JobFailed {
                    job_id: job_id.to_string(),
                    reason,
                });
            }
            JobOutcome::TimedOut { attempts } => BoxOutcome::Unconfirmed { job_id, attempts },
        };
        Ok(PrintedBox {
            printer: printer.name.clone(),
            result: BoxPrintResult { box_number, outcome },
        })
    }

    /// Print every box of the entry, one job per box, in box order.
    pub async fn print_all(
        &self,
        session: &PrintSession,
        catalog: &PrinterCatalog,
        entry: &Entry,
    ) -> Result<BatchReport, WarelabelError> {
        let printer = session.resolve_printer(catalog)?;
        if entry.boxes.is_empty() {
            return Err(WarelabelError::Precondition("No boxes to print.".to_string()));
        }
        self.check_weights(entry)?;
        self.ensure_persisted(entry).await?;

        // One lookup per article, shared by all of its boxes.
        let mut resolved: HashMap<ArticleId, Result<Article, String>> = HashMap::new();
        let mut payloads = Vec::with_capacity(entry.boxes.len());
        for record in entry.boxes.iter() {
            let payload = match Self::box_and_article(entry, record.box_number) {
                Ok((record, id, article)) => {
                    if !resolved.contains_key(&id) {
                        let result = self.with_sku(entry, article).await.map_err(|e| e.to_string());
                        resolved.insert(id, result);
                    }
                    match &resolved[&id] {
                        Ok(article) => Ok(LabelPayload::resolve(entry, record, article)),
                        Err(reason) => Err(reason.clone()),
                    }
                }
                Err(e) => Err(e.to_string()),
            };
            payloads.push((record.box_number, payload));
        }

        let spec = self.spec_for(Some(printer));
        let rendered: Vec<(u32, Result<LabelImage, String>)> = tokio::task::spawn_blocking(move || {
            payloads
                .into_par_iter()
                .map(|(box_number, payload)| {
                    let image = payload.and_then(|p| render_label(&p, &spec).map_err(|e| e.to_string()));
                    (box_number, image)
                })
                .collect()
        })
        .await
        .map_err(|e| WarelabelError::Render(format!("render task failed: {}", e)))?;

        let mut images = Vec::new();
        let mut failures = Vec::new();
        for (box_number, result) in rendered {
            match result {
                Ok(image) => images.push(image),
                Err(reason) => failures.push(BoxPrintResult::failed(box_number, reason)),
            }
        }

        let mut report = if images.is_empty() {
            BatchReport::new(printer.name.clone())
        } else {
            let context = Self::job_context(entry, &spec);
            self.dispatcher
                .print_batch(&context, &printer.name, images, self.config.batch_delay())
                .await?
        };
        report.absorb(failures);
        info!(
            entry = %entry.reference(),
            printer = %printer.name,
            printed = report.printed(),
            failed = report.failures(),
            "batch complete"
        );
        Ok(report)
    }
}
