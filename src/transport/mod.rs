//! # Print Channels
//!
//! This module provides the two ways a rendered label reaches a printer.
//!
//! ## Available Channels
//!
//! - [`bridge`]: the host's local print spooler (`lpstat`/`lp`), used when
//!   running on a desktop host with a spooler
//! - [`remote`]: an HTTP print backend, used everywhere else
//!
//! Both implement [`PrintChannel`]. [`Channel`] is the closed set of the two,
//! chosen once at startup by [`Channel::probe`]; dispatch code only sees the
//! trait.

pub mod bridge;
pub mod remote;

pub use bridge::{CommandOutput, CommandRunner, LocalBridgeChannel, SystemRunner};
pub use remote::RemoteHttpChannel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ChannelPreference, ClientConfig};
use crate::dispatch::{JobId, JobSnapshot};
use crate::error::WarelabelError;
use crate::label::LabelImage;
use crate::printer::{MediaSpec, PrinterInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    LocalBridge,
    RemoteHttp,
}

impl ChannelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LocalBridge => "local_bridge",
            Self::RemoteHttp => "remote_http",
        }
    }
}

/// Everything a channel needs to start one job.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub company: String,
    pub transaction_no: String,
    pub printer_name: String,
    pub media: MediaSpec,
    /// Rendered labels in print order.
    pub images: Vec<LabelImage>,
}

impl SubmitRequest {
    pub fn box_numbers(&self) -> Vec<u32> {
        self.images.iter().map(|i| i.box_number).collect()
    }

    /// Encode every image as PNG off the async executor.
    pub async fn encode_pngs(&self) -> Result<Vec<Vec<u8>>, WarelabelError> {
        let images = self.images.clone();
        tokio::task::spawn_blocking(move || images.iter().map(LabelImage::to_png).collect())
            .await
            .map_err(|e| WarelabelError::Render(format!("encode task failed: {}", e)))?
    }
}

/// The channel's acknowledgement of a submitted job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub job_id: JobId,
    pub labels_count: u32,
}

/// A route to printers: list them, submit a job, report a job's status.
#[async_trait]
pub trait PrintChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    async fn list_printers(&self) -> Result<Vec<PrinterInfo>, WarelabelError>;

    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitReceipt, WarelabelError>;

    async fn poll(&self, job_id: &JobId) -> Result<JobSnapshot, WarelabelError>;
}

/// The print channel selected for this process.
pub enum Channel {
    LocalBridge(LocalBridgeChannel),
    RemoteHttp(RemoteHttpChannel),
}

impl Channel {
    /// Pick a channel according to the configured preference.
    ///
    /// With `auto`, the local bridge is used when a print spooler answers,
    /// otherwise the remote backend.
    pub async fn probe(config: &ClientConfig) -> Result<Self, WarelabelError> {
        let channel = match config.channel {
            ChannelPreference::Local => Self::LocalBridge(LocalBridgeChannel::system(config.spool_dir())),
            ChannelPreference::Remote => Self::RemoteHttp(RemoteHttpChannel::new(
                &config.print_api_url,
                config.request_timeout(),
            )?),
            ChannelPreference::Auto => {
                let bridge = LocalBridgeChannel::system(config.spool_dir());
                if bridge.is_available().await {
                    Self::LocalBridge(bridge)
                } else {
                    Self::RemoteHttp(RemoteHttpChannel::new(
                        &config.print_api_url,
                        config.request_timeout(),
                    )?)
                }
            }
        };
        info!(channel = channel.kind().as_str(), "print channel selected");
        Ok(channel)
    }
}

#[async_trait]
impl PrintChannel for Channel {
    fn kind(&self) -> ChannelKind {
        match self {
            Self::LocalBridge(c) => c.kind(),
            Self::RemoteHttp(c) => c.kind(),
        }
    }

    async fn list_printers(&self) -> Result<Vec<PrinterInfo>, WarelabelError> {
        match self {
            Self::LocalBridge(c) => c.list_printers().await,
            Self::RemoteHttp(c) => c.list_printers().await,
        }
    }

    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitReceipt, WarelabelError> {
        match self {
            Self::LocalBridge(c) => c.submit(request).await,
            Self::RemoteHttp(c) => c.submit(request).await,
        }
    }

    async fn poll(&self, job_id: &JobId) -> Result<JobSnapshot, WarelabelError> {
        match self {
            Self::LocalBridge(c) => c.poll(job_id).await,
            Self::RemoteHttp(c) => c.poll(job_id).await,
        }
    }
}
