use crate::domain::model::{EmailJob, EmailStatus};
use crate::domain::ports::{Clock, EmailQueue, Mailer};
use crate::utils::error::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_SECONDS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::seconds(DEFAULT_BACKOFF_SECONDS),
        }
    }
}

impl RetryPolicy {
    /// Records a failed delivery: schedules the next attempt, or marks the
    /// job failed once `max_attempts` deliveries have been tried.
    pub fn record_failure(&self, job: &mut EmailJob, error: String, now: DateTime<Utc>) {
        job.attempts += 1;
        job.last_error = Some(error);
        if job.attempts >= self.max_attempts {
            job.status = EmailStatus::Failed;
            job.next_attempt_at = None;
        } else {
            job.next_attempt_at = Some(now + self.backoff);
        }
    }

    pub fn record_success(&self, job: &mut EmailJob, now: DateTime<Utc>) {
        job.attempts += 1;
        job.status = EmailStatus::Sent;
        job.sent_at = Some(now);
        job.next_attempt_at = None;
        job.last_error = None;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueReport {
    pub processed: usize,
    pub sent: usize,
    pub retried: usize,
    pub failed: usize,
    /// Jobs whose delivery outcome could not be written back to the queue.
    pub unsaved: usize,
}

/// Drains due notification emails from the queue, one scheduled run at a time.
pub struct EmailQueueProcessor<Q: EmailQueue, M: Mailer, C: Clock> {
    queue: Q,
    mailer: M,
    clock: C,
    policy: RetryPolicy,
}

impl<Q: EmailQueue, M: Mailer, C: Clock> EmailQueueProcessor<Q, M, C> {
    pub fn new(queue: Q, mailer: M, clock: C) -> Self {
        Self::with_policy(queue, mailer, clock, RetryPolicy::default())
    }

    pub fn with_policy(queue: Q, mailer: M, clock: C, policy: RetryPolicy) -> Self {
        Self {
            queue,
            mailer,
            clock,
            policy,
        }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub async fn process(&self) -> Result<QueueReport> {
        let now = self.clock.now();
        let due = self.queue.due(now).await?;
        tracing::info!("Processing {} due email(s)", due.len());

        let mut report = QueueReport::default();
        for mut job in due {
            report.processed += 1;
            match self.mailer.send(&job).await {
                Ok(()) => {
                    self.policy.record_success(&mut job, now);
                    report.sent += 1;
                    tracing::debug!("Sent email {} to {}", job.id, job.to);
                }
                Err(e) => {
                    self.policy.record_failure(&mut job, e.to_string(), now);
                    if job.status == EmailStatus::Failed {
                        report.failed += 1;
                        tracing::error!(
                            "❌ Email {} failed permanently after {} attempts: {}",
                            job.id,
                            job.attempts,
                            e
                        );
                    } else {
                        report.retried += 1;
                        tracing::warn!(
                            "Email {} attempt {} failed, retrying after {:?}: {}",
                            job.id,
                            job.attempts,
                            job.next_attempt_at,
                            e
                        );
                    }
                }
            }
            if let Err(e) = self.queue.save(&job).await {
                report.unsaved += 1;
                tracing::error!(
                    "❌ Could not record email {} as {:?} after attempt {}: {}",
                    job.id,
                    job.status,
                    job.attempts,
                    e
                );
            }
        }

        if report.unsaved > 0 {
            tracing::warn!("{} email outcome(s) were not saved", report.unsaved);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryEmailQueue;
    use crate::utils::error::MarketError;
    use crate::utils::time::FixedClock;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct RecordingMailer {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, job: &EmailJob) -> Result<()> {
            self.sent.lock().unwrap().push(job.id.clone());
            Ok(())
        }
    }

    /// Delegates to a memory queue but refuses to save the listed job ids.
    struct ReadOnlyJobs {
        inner: MemoryEmailQueue,
        locked: Vec<&'static str>,
    }

    impl EmailQueue for ReadOnlyJobs {
        async fn enqueue(&self, job: &EmailJob) -> Result<()> {
            self.inner.enqueue(job).await
        }

        async fn due(&self, now: DateTime<Utc>) -> Result<Vec<EmailJob>> {
            self.inner.due(now).await
        }

        async fn save(&self, job: &EmailJob) -> Result<()> {
            if self.locked.iter().any(|id| *id == job.id) {
                return Err(MarketError::StorageError {
                    message: "disk full".to_string(),
                });
            }
            self.inner.save(job).await
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 2, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_failure_schedules_backoff() {
        let policy = RetryPolicy::default();
        let mut job = EmailJob::new("1", "to@example.edu", "s", "b", t0());
        policy.record_failure(&mut job, "timeout".to_string(), t0());
        assert_eq!(job.status, EmailStatus::Pending);
        assert_eq!(job.attempts, 1);
        assert_eq!(job.next_attempt_at, Some(t0() + Duration::seconds(300)));
        assert!(!job.is_due(t0() + Duration::seconds(299)));
        assert!(job.is_due(t0() + Duration::seconds(300)));
    }

    #[test]
    fn test_third_failure_is_terminal() {
        let policy = RetryPolicy::default();
        let mut job = EmailJob::new("1", "to@example.edu", "s", "b", t0());
        for _ in 0..3 {
            policy.record_failure(&mut job, "boom".to_string(), t0());
        }
        assert_eq!(job.status, EmailStatus::Failed);
        assert_eq!(job.attempts, 3);
        assert_eq!(job.next_attempt_at, None);
        assert!(!job.is_due(t0() + Duration::days(1)));
    }

    #[test]
    fn test_success_clears_error() {
        let policy = RetryPolicy::default();
        let mut job = EmailJob::new("1", "to@example.edu", "s", "b", t0());
        policy.record_failure(&mut job, "boom".to_string(), t0());
        policy.record_success(&mut job, t0() + Duration::minutes(5));
        assert_eq!(job.status, EmailStatus::Sent);
        assert_eq!(job.attempts, 2);
        assert_eq!(job.last_error, None);
        assert_eq!(job.sent_at, Some(t0() + Duration::minutes(5)));
    }

    #[tokio::test]
    async fn test_failed_save_does_not_stop_the_run() {
        let queue = ReadOnlyJobs {
            inner: MemoryEmailQueue::new(),
            locked: vec!["a"],
        };
        for id in ["a", "b", "c"] {
            queue
                .enqueue(&EmailJob::new(id, "to@example.edu", "s", "b", t0()))
                .await
                .unwrap();
        }
        let mailer = RecordingMailer {
            sent: Mutex::new(Vec::new()),
        };
        let processor = EmailQueueProcessor::new(queue, mailer, FixedClock::new(t0()));

        let report = processor.process().await.unwrap();
        assert_eq!(report.processed, 3);
        assert_eq!(report.sent, 3);
        assert_eq!(report.unsaved, 1);

        let inner = &processor.queue().inner;
        assert_eq!(inner.get("a").await.unwrap().status, EmailStatus::Pending);
        assert_eq!(inner.get("b").await.unwrap().status, EmailStatus::Sent);
        assert_eq!(inner.get("c").await.unwrap().status, EmailStatus::Sent);
    }
}
