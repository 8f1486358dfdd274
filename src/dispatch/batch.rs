//! Sequential batch dispatch.
//!
//! Each box is its own job. Boxes go out one at a time in the given order,
//! with a pause between jobs, and a failing box never stops the rest.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use super::job::{JobId, JobOutcome};
use super::{Dispatcher, JobContext};
use crate::error::WarelabelError;
use crate::label::LabelImage;

/// What happened to one box.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BoxOutcome {
    Printed { job_id: JobId },
    /// Rendering, submission or the job itself failed.
    Failed { reason: String },
    /// Submitted, but no terminal status was seen in time.
    Unconfirmed { job_id: JobId, attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPrintResult {
    pub box_number: u32,
    #[serde(flatten)]
    pub outcome: BoxOutcome,
}

impl BoxPrintResult {
    pub fn failed(box_number: u32, reason: impl Into<String>) -> Self {
        Self {
            box_number,
            outcome: BoxOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_printed(&self) -> bool {
        matches!(self.outcome, BoxOutcome::Printed { .. })
    }

    /// User-facing line for this box.
    pub fn message(&self, printer: &str) -> String {
        match &self.outcome {
            BoxOutcome::Printed { job_id } => {
                format!("Printed box {} on {} (job {})", self.box_number, printer, job_id)
            }
            BoxOutcome::Failed { reason } => format!("Box {} failed: {}", self.box_number, reason),
            BoxOutcome::Unconfirmed { job_id, attempts } => format!(
                "Could not confirm completion of box {} on {} (job {}) after {} checks",
                self.box_number, printer, job_id, attempts
            ),
        }
    }
}

/// Per-box results of a batch, in box order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub printer: String,
    pub results: Vec<BoxPrintResult>,
}

impl BatchReport {
    pub fn new(printer: impl Into<String>) -> Self {
        Self {
            printer: printer.into(),
            results: Vec::new(),
        }
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.is_printed()).count()
    }

    pub fn printed(&self) -> usize {
        self.results.len() - self.failures()
    }

    /// Fold in results produced outside dispatch and restore box order.
    pub fn absorb(&mut self, results: impl IntoIterator<Item = BoxPrintResult>) {
        self.results.extend(results);
        self.results.sort_by_key(|r| r.box_number);
    }

    pub fn message(&self) -> String {
        let total = self.results.len();
        if self.failures() == 0 {
            return format!("Printed {} label(s) on {}", total, self.printer);
        }
        let problems: Vec<String> = self
            .results
            .iter()
            .filter(|r| !r.is_printed())
            .map(|r| r.message(&self.printer))
            .collect();
        format!(
            "Printed {} of {} label(s) on {}; {} failed. {}",
            self.printed(),
            total,
            self.printer,
            self.failures(),
            problems.join("; ")
        )
    }
}

impl Dispatcher {
    /// Print each image as its own job, strictly in order.
    pub async fn print_batch(
        &self,
        context: &JobContext,
        printer: &str,
        images: Vec<LabelImage>,
        delay: Duration,
    ) -> Result<BatchReport, WarelabelError> {
        let printer = printer.trim();
        if printer.is_empty() {
            return Err(WarelabelError::Precondition(
                "No printer selected. Select a printer before printing.".to_string(),
            ));
        }
        if images.is_empty() {
            return Err(WarelabelError::Precondition("No boxes to print.".to_string()));
        }

        let total = images.len();
        let mut report = BatchReport::new(printer);
        for (index, image) in images.into_iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let box_number = image.box_number;
            let outcome = match self.print_one(context, printer, image).await {
                Ok((job_id, JobOutcome::Completed)) => BoxOutcome::Printed { job_id },
                Ok((job_id, JobOutcome::Failed { reason })) => BoxOutcome::Failed {
                    reason: WarelabelError::JobFailed {
                        job_id: job_id.to_string(),
                        reason,
                    }
                    .to_string(),
                },
                Ok((job_id, JobOutcome::TimedOut { attempts })) => {
                    BoxOutcome::Unconfirmed { job_id, attempts }
                }
                Err(e) => {
                    warn!(box_number, error = %e, "box not dispatched");
                    BoxOutcome::Failed { reason: e.to_string() }
                }
            };
            report.results.push(BoxPrintResult { box_number, outcome });
            info!(box_number, done = index + 1, total, "batch progress");
        }

        if report.failures() > 0 {
            warn!(printer = %printer, failures = report.failures(), total, "batch finished with failures");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn printed(box_number: u32) -> BoxPrintResult {
        BoxPrintResult {
            box_number,
            outcome: BoxOutcome::Printed {
                job_id: JobId(format!("Zebra-{}", box_number)),
            },
        }
    }

    #[test]
    fn test_all_printed_message() {
        let mut report = BatchReport::new("Zebra");
        report.results = vec![printed(1), printed(2)];
        assert_eq!(report.failures(), 0);
        assert_eq!(report.message(), "Printed 2 label(s) on Zebra");
    }

    #[test]
    fn test_unconfirmed_message() {
        let result = BoxPrintResult {
            box_number: 4,
            outcome: BoxOutcome::Unconfirmed {
                job_id: "Zebra-9".into(),
                attempts: 30,
            },
        };
        assert_eq!(
            result.message("Zebra"),
            "Could not confirm completion of box 4 on Zebra (job Zebra-9) after 30 checks"
        );
    }

    #[test]
    fn test_partial_failure_message() {
        let mut report = BatchReport::new("Zebra");
        report.results = vec![printed(1), printed(3)];
        report.absorb([BoxPrintResult::failed(2, "Render error: too dense")]);

        assert_eq!(
            report.results.iter().map(|r| r.box_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!((report.printed(), report.failures()), (2, 1));
        assert_eq!(
            report.message(),
            "Printed 2 of 3 label(s) on Zebra; 1 failed. Box 2 failed: Render error: too dense"
        );
    }

    #[test]
    fn test_result_serialization() {
        let json = serde_json::to_value(printed(1)).unwrap();
        assert_eq!(json["box_number"], 1);
        assert_eq!(json["result"], "printed");
        assert_eq!(json["job_id"], "Zebra-1");
    }
}
