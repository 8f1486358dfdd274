//! # Print Dispatch
//!
//! Submits rendered labels through a [`PrintChannel`] and watches each job
//! until it reaches a terminal state or the poll policy gives up.
//!
//! ## Modules
//!
//! - [`job`]: Job identifiers, status and the monotonic job record
//! - [`poll`]: Poll interval and attempt limits
//! - [`batch`]: Sequential multi-box dispatch with per-box results
//!
//! Precondition failures (no printer, nothing to print) are raised before the
//! channel is touched. Dispatch and job failures are never retried.

pub mod batch;
pub mod job;
pub mod poll;

pub use batch::{BatchReport, BoxOutcome, BoxPrintResult};
pub use job::{JobId, JobOutcome, JobSnapshot, JobStatus, PrintJob};
pub use poll::PollPolicy;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::error::WarelabelError;
use crate::label::LabelImage;
use crate::printer::MediaSpec;
use crate::transport::{PrintChannel, SubmitRequest};

/// Transaction details carried with every job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobContext {
    pub company: String,
    pub transaction_no: String,
    pub media: MediaSpec,
}

type JobTable = Mutex<HashMap<JobId, PrintJob>>;

fn lock_table(jobs: &JobTable) -> MutexGuard<'_, HashMap<JobId, PrintJob>> {
    match jobs.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("job table lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Removes a job from the table when the wait on it ends, however it ends.
struct TrackedJob<'a> {
    jobs: &'a JobTable,
    job_id: &'a JobId,
}

impl Drop for TrackedJob<'_> {
    fn drop(&mut self) {
        if lock_table(self.jobs).remove(self.job_id).is_some() {
            debug!(job_id = %self.job_id, "job released");
        }
    }
}

/// Owns in-flight jobs for one print channel.
///
/// The job table is only locked between awaits, never across one.
pub struct Dispatcher {
    channel: Arc<dyn PrintChannel>,
    policy: PollPolicy,
    jobs: JobTable,
}

impl Dispatcher {
    pub fn new(channel: Arc<dyn PrintChannel>, policy: PollPolicy) -> Self {
        Self {
            channel,
            policy,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn channel(&self) -> &Arc<dyn PrintChannel> {
        &self.channel
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Current record of an in-flight job.
    pub async fn job(&self, job_id: &JobId) -> Option<PrintJob> {
        lock_table(&self.jobs).get(job_id).cloned()
    }

    pub async fn active_jobs(&self) -> usize {
        lock_table(&self.jobs).len()
    }

    /// Hand `images` to the channel as one job on `printer`.
    pub async fn submit_job(
        &self,
        context: &JobContext,
        printer: &str,
        images: Vec<LabelImage>,
    ) -> Result<JobId, WarelabelError> {
        let printer = printer.trim();
        if printer.is_empty() {
            return Err(WarelabelError::Precondition(
                "No printer selected. Select a printer before printing.".to_string(),
            ));
        }
        if images.is_empty() {
            return Err(WarelabelError::Precondition("Nothing to print.".to_string()));
        }

        let request = SubmitRequest {
            company: context.company.clone(),
            transaction_no: context.transaction_no.clone(),
            printer_name: printer.to_string(),
            media: context.media,
            images,
        };
        let receipt = self.channel.submit(&request).await?;
        if receipt.labels_count as usize != request.images.len() {
            warn!(
                job_id = %receipt.job_id,
                expected = request.images.len(),
                accepted = receipt.labels_count,
                "channel accepted a different number of labels"
            );
        }

        let job = PrintJob::new(receipt.job_id.clone(), printer, request.images);
        info!(
            job_id = %job.id,
            printer = %job.printer,
            boxes = ?job.box_numbers(),
            channel = self.channel.kind().as_str(),
            "print job queued"
        );
        lock_table(&self.jobs).insert(receipt.job_id.clone(), job);
        Ok(receipt.job_id)
    }

    /// Poll a submitted job until it is terminal or the attempt limit is hit.
    ///
    /// Failed status checks count as attempts. The job is dropped from the
    /// table once this returns, or when the returned future is dropped.
    pub async fn wait_for_completion(&self, job_id: &JobId) -> Result<JobOutcome, WarelabelError> {
        if !lock_table(&self.jobs).contains_key(job_id) {
            return Err(WarelabelError::NotFound(format!("print job {}", job_id)));
        }
        let _tracked = TrackedJob {
            jobs: &self.jobs,
            job_id,
        };

        let mut outcome = JobOutcome::TimedOut {
            attempts: self.policy.max_attempts,
        };
        for attempt in 0..self.policy.max_attempts {
            tokio::time::sleep(self.policy.delay(attempt)).await;

            let snapshot = match self.channel.poll(job_id).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(job_id = %job_id, attempt = attempt + 1, error = %e, "job status check failed");
                    continue;
                }
            };

            let terminal = {
                let mut jobs = lock_table(&self.jobs);
                let Some(job) = jobs.get_mut(job_id) else {
                    return Err(WarelabelError::NotFound(format!("print job {}", job_id)));
                };
                job.observe(&snapshot);
                debug!(job_id = %job_id, status = job.status.as_str(), progress = job.progress, "job status");
                poll::outcome_of(job)
            };
            if let Some(terminal) = terminal {
                outcome = terminal;
                break;
            }
        }

        match &outcome {
            JobOutcome::Completed => info!(job_id = %job_id, "print job completed"),
            JobOutcome::Failed { reason } => warn!(job_id = %job_id, reason = %reason, "print job failed"),
            JobOutcome::TimedOut { attempts } => {
                warn!(job_id = %job_id, attempts, "gave up waiting for print job")
            }
        }
        Ok(outcome)
    }

    /// Submit one job and wait for it.
    pub async fn print_one(
        &self,
        context: &JobContext,
        printer: &str,
        image: LabelImage,
    ) -> Result<(JobId, JobOutcome), WarelabelError> {
        let job_id = self.submit_job(context, printer, vec![image]).await?;
        let outcome = self.wait_for_completion(&job_id).await?;
        Ok((job_id, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::printer::PrinterInfo;
    use crate::transport::{ChannelKind, SubmitReceipt};

    /// Replays a fixed list of poll snapshots.
    #[derive(Default)]
    struct ReplayChannel {
        polls: Mutex<VecDeque<Result<JobSnapshot, WarelabelError>>>,
        submits: AtomicUsize,
        poll_calls: AtomicUsize,
    }

    impl ReplayChannel {
        fn with_polls(polls: Vec<Result<JobSnapshot, WarelabelError>>) -> Arc<Self> {
            Arc::new(Self {
                polls: Mutex::new(polls.into()),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl PrintChannel for ReplayChannel {
        fn kind(&self) -> ChannelKind {
            ChannelKind::RemoteHttp
        }

        async fn list_printers(&self) -> Result<Vec<PrinterInfo>, WarelabelError> {
            Ok(vec![])
        }

        async fn submit(&self, request: &SubmitRequest) -> Result<SubmitReceipt, WarelabelError> {
            let n = self.submits.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(SubmitReceipt {
                job_id: JobId(format!("job-{}", n)),
                labels_count: request.images.len() as u32,
            })
        }

        async fn poll(&self, _job_id: &JobId) -> Result<JobSnapshot, WarelabelError> {
            self.poll_calls.fetch_add(1, Ordering::SeqCst);
            self.polls
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(JobSnapshot::new(JobStatus::Queued, 0)))
        }
    }

    fn context() -> JobContext {
        JobContext {
            company: "ACME".to_string(),
            transaction_no: "INW-1".to_string(),
            media: MediaSpec::new(4.0, 2.0, 203),
        }
    }

    fn image(box_number: u32) -> LabelImage {
        LabelImage {
            box_number,
            dpi: 203,
            image: image::GrayImage::new(8, 8),
        }
    }

    fn policy() -> PollPolicy {
        PollPolicy::fixed(Duration::from_millis(100), 5)
    }

    #[tokio::test]
    async fn test_empty_printer_makes_no_calls() {
        let channel = ReplayChannel::with_polls(vec![]);
        let dispatcher = Dispatcher::new(channel.clone(), policy());
        let err = dispatcher.submit_job(&context(), "  ", vec![image(1)]).await.unwrap_err();
        assert!(matches!(err, WarelabelError::Precondition(_)));
        let err = dispatcher.submit_job(&context(), "Zebra", vec![]).await.unwrap_err();
        assert!(matches!(err, WarelabelError::Precondition(_)));
        assert_eq!(channel.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_and_drops_job() {
        let channel = ReplayChannel::with_polls(vec![
            Ok(JobSnapshot::new(JobStatus::Queued, 0)),
            Ok(JobSnapshot::new(JobStatus::Printing, 40)),
            Ok(JobSnapshot::new(JobStatus::Completed, 100)),
        ]);
        let dispatcher = Dispatcher::new(channel.clone(), policy());
        let job_id = dispatcher.submit_job(&context(), "Zebra", vec![image(1)]).await.unwrap();
        assert_eq!(dispatcher.job(&job_id).await.unwrap().status, JobStatus::Queued);

        let outcome = dispatcher.wait_for_completion(&job_id).await.unwrap();
        assert_eq!(outcome, JobOutcome::Completed);
        assert_eq!(channel.poll_calls.load(Ordering::SeqCst), 3);
        assert_eq!(dispatcher.active_jobs().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_errors_count_as_attempts() {
        let channel = ReplayChannel::with_polls(vec![
            Err(WarelabelError::transport("jobs", "connection reset")),
            Ok(JobSnapshot::failed("head open")),
        ]);
        let dispatcher = Dispatcher::new(channel.clone(), policy());
        let (_, outcome) = dispatcher.print_one(&context(), "Zebra", image(1)).await.unwrap();
        assert_eq!(
            outcome,
            JobOutcome::Failed {
                reason: "head open".to_string()
            }
        );
        assert_eq!(channel.poll_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_leaving_queue_times_out() {
        let channel = ReplayChannel::with_polls(vec![]);
        let dispatcher = Dispatcher::new(channel.clone(), policy());
        let (_, outcome) = dispatcher.print_one(&context(), "Zebra", image(1)).await.unwrap();
        assert_eq!(outcome, JobOutcome::TimedOut { attempts: 5 });
        assert_eq!(channel.poll_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_wait_releases_job() {
        let channel = ReplayChannel::with_polls(vec![]);
        let dispatcher = Dispatcher::new(channel.clone(), PollPolicy::fixed(Duration::from_secs(2), 30));

        let waited = tokio::time::timeout(
            Duration::from_secs(5),
            dispatcher.print_one(&context(), "Zebra", image(1)),
        )
        .await;

        assert!(waited.is_err());
        assert_eq!(channel.poll_calls.load(Ordering::SeqCst), 2);
        assert_eq!(dispatcher.active_jobs().await, 0);
        assert!(dispatcher.job(&"job-1".into()).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let dispatcher = Dispatcher::new(ReplayChannel::with_polls(vec![]), policy());
        let err = dispatcher.wait_for_completion(&"nope".into()).await.unwrap_err();
        assert!(matches!(err, WarelabelError::NotFound(_)));
    }
}
