//! Bounded status polling.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::job::{JobOutcome, JobStatus, PrintJob};

/// How a job is watched after submission.
///
/// The n-th check (0-based) waits `interval * backoff^n`, capped at
/// `max_interval`. A backoff of 1.0 polls on a fixed interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    #[serde(with = "millis")]
    pub interval: Duration,
    pub max_attempts: u32,
    pub backoff: f64,
    #[serde(with = "millis")]
    pub max_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
            backoff: 1.0,
            max_interval: Duration::from_secs(10),
        }
    }
}

impl PollPolicy {
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
            backoff: 1.0,
            max_interval: interval,
        }
    }

    /// Wait before the given check. Never exceeds the cap, whatever the
    /// policy values.
    pub fn delay(&self, attempt: u32) -> Duration {
        let cap = self.max_interval.max(self.interval);
        let factor = self.backoff.max(1.0).powi(attempt.min(64) as i32);
        Duration::try_from_secs_f64(self.interval.as_secs_f64() * factor).map_or(cap, |delay| delay.min(cap))
    }
}

/// The outcome a job has reached, if it is terminal.
pub fn outcome_of(job: &PrintJob) -> Option<JobOutcome> {
    match job.status {
        JobStatus::Completed => Some(JobOutcome::Completed),
        JobStatus::Failed => Some(JobOutcome::Failed {
            reason: job
                .error
                .clone()
                .unwrap_or_else(|| "print backend reported failure".to_string()),
        }),
        JobStatus::Queued | JobStatus::Printing => None,
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
