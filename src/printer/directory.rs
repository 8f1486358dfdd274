//! Printer discovery and auto-selection.
//!
//! Discovery asks the active print channel for its printers under a time
//! limit. Any failure, or an empty answer, yields a catalog holding only the
//! synthetic `default` sink, so callers always have something to list.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use super::config::PrinterInfo;
use crate::transport::PrintChannel;

/// Where a catalog's entries came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    /// Reported by the print channel.
    Discovered,
    /// Discovery failed or was empty; only the synthetic default sink.
    Fallback,
}

/// The printers known to this session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrinterCatalog {
    pub source: CatalogSource,
    pub printers: Vec<PrinterInfo>,
}

impl PrinterCatalog {
    /// Build from discovered printers; empty input falls back to the default sink.
    pub fn from_discovered(printers: Vec<PrinterInfo>) -> Self {
        if printers.is_empty() {
            return Self::fallback();
        }
        Self {
            source: CatalogSource::Discovered,
            printers,
        }
    }

    pub fn fallback() -> Self {
        Self {
            source: CatalogSource::Fallback,
            printers: vec![PrinterInfo::synthetic_default()],
        }
    }

    pub fn find(&self, name: &str) -> Option<&PrinterInfo> {
        self.printers.iter().find(|p| p.name == name)
    }

    /// First printer that is online and supports labels.
    pub fn auto_select(&self) -> Option<&PrinterInfo> {
        self.printers.iter().find(|p| p.is_label_ready())
    }

    pub fn names(&self) -> Vec<&str> {
        self.printers.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Query a channel for printers, bounded by `limit`.
pub async fn discover<C: PrintChannel + ?Sized>(channel: &C, limit: Duration) -> PrinterCatalog {
    match tokio::time::timeout(limit, channel.list_printers()).await {
        Ok(Ok(printers)) => {
            info!(
                channel = channel.kind().as_str(),
                count = printers.len(),
                "discovered printers"
            );
            PrinterCatalog::from_discovered(printers)
        }
        Ok(Err(e)) => {
            warn!(channel = channel.kind().as_str(), error = %e, "printer discovery failed");
            PrinterCatalog::fallback()
        }
        Err(_) => {
            warn!(
                channel = channel.kind().as_str(),
                timeout_ms = limit.as_millis() as u64,
                "printer discovery timed out"
            );
            PrinterCatalog::fallback()
        }
    }
}
