use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use httpmock::prelude::*;
use std::sync::Arc;
use sublease_core::core::{EmailJob, EmailQueue, EmailStatus};
use sublease_core::{EmailQueueProcessor, FixedClock, HttpMailer, MemoryEmailQueue, RetryPolicy};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 10, 7, 0, 0).unwrap()
}

fn reminder(id: &str) -> EmailJob {
    EmailJob::new(
        id,
        "tenant@umn.edu",
        "Your listing is hidden",
        "Reactivate within 5 days to keep it.",
        t0(),
    )
}

#[tokio::test]
async fn test_due_emails_are_sent() -> Result<()> {
    let server = MockServer::start();
    let send_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/send")
            .header("authorization", "Bearer mail-key")
            .json_body(serde_json::json!({
                "from": "notify@sublease.test",
                "to": "tenant@umn.edu",
                "subject": "Your listing is hidden",
                "text": "Reactivate within 5 days to keep it."
            }));
        then.status(202);
    });

    let queue = MemoryEmailQueue::new();
    queue.enqueue(&reminder("job-1")).await?;

    let mailer = HttpMailer::new(
        server.url("/send"),
        Some("mail-key".to_string()),
        "notify@sublease.test",
    );
    let processor = EmailQueueProcessor::new(queue, mailer, FixedClock::new(t0()));

    let report = processor.process().await?;
    send_mock.assert();
    assert_eq!(report.processed, 1);
    assert_eq!(report.sent, 1);

    let job = processor.queue().get("job-1").await.expect("job saved");
    assert_eq!(job.status, EmailStatus::Sent);
    assert_eq!(job.sent_at, Some(t0()));

    // Sent mail is not picked up again.
    let again = processor.process().await?;
    assert_eq!(again.processed, 0);
    send_mock.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn test_failures_back_off_then_become_terminal() -> Result<()> {
    let server = MockServer::start();
    let failing = server.mock(|when, then| {
        when.method(POST).path("/send");
        then.status(503).body("upstream unavailable");
    });

    let clock = Arc::new(FixedClock::new(t0()));
    let queue = MemoryEmailQueue::new();
    queue.enqueue(&reminder("job-2")).await?;
    let mailer = HttpMailer::new(server.url("/send"), None, "notify@sublease.test");
    let processor =
        EmailQueueProcessor::with_policy(queue, mailer, clock.clone(), RetryPolicy::default());

    let first = processor.process().await?;
    assert_eq!(first.retried, 1);
    let job = processor.queue().get("job-2").await.expect("job saved");
    assert_eq!(job.status, EmailStatus::Pending);
    assert_eq!(job.attempts, 1);
    assert_eq!(job.next_attempt_at, Some(t0() + Duration::seconds(300)));
    assert!(job.last_error.unwrap_or_default().contains("503"));

    // Still backing off four minutes later.
    clock.advance(Duration::minutes(4));
    assert_eq!(processor.process().await?.processed, 0);

    clock.advance(Duration::minutes(1));
    assert_eq!(processor.process().await?.retried, 1);

    clock.advance(Duration::minutes(5));
    let last = processor.process().await?;
    assert_eq!(last.failed, 1);

    let job = processor.queue().get("job-2").await.expect("job saved");
    assert_eq!(job.status, EmailStatus::Failed);
    assert_eq!(job.attempts, 3);
    assert_eq!(job.next_attempt_at, None);

    clock.advance(Duration::days(1));
    assert_eq!(processor.process().await?.processed, 0);
    failing.assert_hits(3);
    Ok(())
}
