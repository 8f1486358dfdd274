//! # Error Types
//!
//! This module defines error types used throughout the warelabel library.
//!
//! Validation and precondition failures are resolved locally and never reach
//! a print channel. Resolution and transport failures carry the identifier
//! that caused them so the message can be shown to the user as-is.

use std::fmt;

use thiserror::Error;

/// Main error type for warelabel operations
#[derive(Debug, Error)]
pub enum WarelabelError {
    /// Missing or malformed label fields, or an enforced weight mismatch
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// SKU lookup failed for an article
    #[error("Could not resolve SKU for '{description}': {reason}")]
    Resolution { description: String, reason: String },

    /// A local precondition was not met (no printer, empty batch, ...)
    #[error("{0}")]
    Precondition(String),

    /// Network or timeout error on a remote call
    #[error("Transport error ({target}): {reason}")]
    Transport { target: String, reason: String },

    /// The print channel rejected a job
    #[error("Printer '{printer}' rejected the job: {reason}")]
    Dispatch { printer: String, reason: String },

    /// The print backend reported the job as failed
    #[error("Print job {job_id} failed: {reason}")]
    JobFailed { job_id: String, reason: String },

    /// Label rendering or image encoding error
    #[error("Render error: {0}")]
    Render(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Entry or box not found in the local model
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WarelabelError {
    /// Shorthand for a transport error against a named target.
    pub fn transport(target: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Transport {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error was raised before any remote call was attempted.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Precondition(_) | Self::NotFound(_))
    }
}

/// A single field-level problem.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldIssue {
    /// A mandatory field was absent or blank.
    Missing(&'static str),
    /// A date field could not be parsed.
    MalformedDate { field: &'static str, value: String },
    /// Box weights do not add up to the article aggregate.
    WeightMismatch {
        description: String,
        kind: &'static str,
        expected: f64,
        actual: f64,
    },
    /// A numeric value was out of range.
    OutOfRange { field: &'static str, value: f64 },
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "missing {}", field),
            Self::MalformedDate { field, value } => {
                write!(f, "malformed {} '{}' (expected YYYY-MM-DD)", field, value)
            }
            Self::WeightMismatch {
                description,
                kind,
                expected,
                actual,
            } => write!(
                f,
                "{} weight of '{}' boxes is {:.2}, expected {:.2}",
                kind, description, actual, expected
            ),
            Self::OutOfRange { field, value } => write!(f, "{} out of range ({})", field, value),
        }
    }
}

/// Every problem found in one validation pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: FieldIssue) {
        self.issues.push(issue);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// `Ok(())` when no issues were collected.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Names of missing mandatory fields, in the order they were found.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.issues
            .iter()
            .filter_map(|issue| match issue {
                FieldIssue::Missing(field) => Some(*field),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}
