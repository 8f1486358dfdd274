//! Print job state.
//!
//! ```text
//! queued ──→ printing ──→ completed
//!                    └──→ failed
//! ```
//!
//! `queued` is entered on creation. Later states are reported by the print
//! channel and only observed here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::label::LabelImage;

/// Identifier assigned by the print channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Printing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Printing => "printing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// One status report from the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default, alias = "error_message")]
    pub error: Option<String>,
}

impl JobSnapshot {
    pub fn new(status: JobStatus, progress: u8) -> Self {
        Self {
            status,
            progress,
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            progress: 0,
            error: Some(reason.into()),
        }
    }
}

/// A job owned by the dispatcher until it reaches a terminal state.
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub id: JobId,
    pub printer: String,
    /// Rendered labels in print order.
    pub images: Vec<LabelImage>,
    pub status: JobStatus,
    /// 0–100, never decreases.
    pub progress: u8,
    pub error: Option<String>,
}

impl PrintJob {
    pub fn new(id: JobId, printer: impl Into<String>, images: Vec<LabelImage>) -> Self {
        Self {
            id,
            printer: printer.into(),
            images,
            status: JobStatus::Queued,
            progress: 0,
            error: None,
        }
    }

    /// Fold a channel report into the job.
    ///
    /// Progress is clamped to 100 and never moves backwards; a completed job
    /// always reads 100. Terminal jobs ignore further reports.
    pub fn observe(&mut self, snapshot: &JobSnapshot) {
        if self.status.is_terminal() {
            return;
        }
        self.status = snapshot.status;
        self.progress = self.progress.max(snapshot.progress.min(100));
        if snapshot.status == JobStatus::Completed {
            self.progress = 100;
        }
        if snapshot.error.is_some() {
            self.error = snapshot.error.clone();
        }
    }

    pub fn box_numbers(&self) -> Vec<u32> {
        self.images.iter().map(|i| i.box_number).collect()
    }
}

/// How watching a job ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    Completed,
    Failed { reason: String },
    /// No terminal status was seen within the attempt limit.
    TimedOut { attempts: u32 },
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}
