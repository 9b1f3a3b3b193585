//! Background report delivery.
//!
//! Reports are handed to a detached worker through an unbounded queue so the
//! request path never waits on the collector. Once queued, a dispatch runs
//! its retries to completion or exhaustion; there is no cancellation path.
//! Exhaustion is terminal for that report only - it is logged and counted,
//! and the session stays closed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::domain::foundation::DispatchId;
use crate::domain::session::ScamReport;
use crate::ports::ReportSink;

/// Retry behavior for one queued report.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total delivery attempts, including the first.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            pause: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Sets the total attempt count.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the pause between attempts.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }
}

struct QueuedReport {
    dispatch_id: DispatchId,
    report: ScamReport,
}

/// Handle to the background delivery worker.
///
/// Cloning is cheap; all clones feed the same queue and share the same
/// outcome counters. The worker drains remaining reports and exits when the
/// last handle is dropped.
#[derive(Clone)]
pub struct ReportDispatcher {
    tx: mpsc::UnboundedSender<QueuedReport>,
    delivered: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

impl ReportDispatcher {
    /// Spawns the worker task and returns the queue handle.
    pub fn spawn(sink: Arc<dyn ReportSink>, policy: RetryPolicy) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<QueuedReport>();
        let delivered = Arc::new(AtomicU64::new(0));
        let failed = Arc::new(AtomicU64::new(0));

        let worker_delivered = Arc::clone(&delivered);
        let worker_failed = Arc::clone(&failed);
        tokio::spawn(async move {
            while let Some(queued) = rx.recv().await {
                deliver_with_retries(
                    sink.as_ref(),
                    &policy,
                    queued,
                    &worker_delivered,
                    &worker_failed,
                )
                .await;
            }
        });

        Self {
            tx,
            delivered,
            failed,
        }
    }

    /// Queues one report for delivery and returns its tracking id.
    ///
    /// Never blocks. The caller is responsible for invoking this at most
    /// once per session, which it guarantees by latching the record's
    /// report-sent flag first.
    pub fn enqueue(&self, report: ScamReport) -> DispatchId {
        let dispatch_id = DispatchId::new();
        let session_id = report.session_id.clone();

        if self
            .tx
            .send(QueuedReport {
                dispatch_id,
                report,
            })
            .is_err()
        {
            // Worker gone; nothing to do but make the loss observable.
            self.failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                session_id = %session_id,
                dispatch_id = %dispatch_id,
                "report worker is gone, report dropped"
            );
        }
        dispatch_id
    }

    /// Reports delivered successfully since the worker started.
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Reports that exhausted their retries (or were dropped).
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for ReportDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportDispatcher")
            .field("delivered", &self.delivered_count())
            .field("failed", &self.failed_count())
            .finish_non_exhaustive()
    }
}

/// Runs one report through the retry loop.
async fn deliver_with_retries(
    sink: &dyn ReportSink,
    policy: &RetryPolicy,
    queued: QueuedReport,
    delivered: &AtomicU64,
    failed: &AtomicU64,
) {
    let QueuedReport {
        dispatch_id,
        report,
    } = queued;

    for attempt in 1..=policy.max_attempts {
        match sink.deliver(&report).await {
            Ok(()) => {
                delivered.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    session_id = %report.session_id,
                    dispatch_id = %dispatch_id,
                    attempt,
                    "report delivered"
                );
                return;
            }
            Err(error) => {
                tracing::warn!(
                    session_id = %report.session_id,
                    dispatch_id = %dispatch_id,
                    attempt,
                    error = %error,
                    "report delivery attempt failed"
                );
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.pause).await;
                }
            }
        }
    }

    failed.fetch_add(1, Ordering::Relaxed);
    tracing::error!(
        session_id = %report.session_id,
        dispatch_id = %dispatch_id,
        attempts = policy.max_attempts,
        "report delivery exhausted retries"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;
    use crate::domain::session::SessionRecord;
    use crate::ports::ReportError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CountingSink {
        attempts: AtomicU64,
        failures_before_success: u64,
        delivered: Mutex<Vec<ScamReport>>,
    }

    impl CountingSink {
        fn succeeding() -> Self {
            Self::failing_times(0)
        }

        fn failing_times(failures_before_success: u64) -> Self {
            Self {
                attempts: AtomicU64::new(0),
                failures_before_success,
                delivered: Mutex::new(Vec::new()),
            }
        }

        fn attempts(&self) -> u64 {
            self.attempts.load(Ordering::Relaxed)
        }

        fn delivered(&self) -> Vec<ScamReport> {
            self.delivered.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReportSink for CountingSink {
        async fn deliver(&self, report: &ScamReport) -> Result<(), ReportError> {
            let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
            if attempt <= self.failures_before_success {
                return Err(ReportError::Rejected { status: 503 });
            }
            self.delivered.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    fn report(id: &str) -> ScamReport {
        let mut record = SessionRecord::new(SessionId::new(id).unwrap());
        record.begin_turn();
        ScamReport::from_record(&record)
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::default().with_pause(Duration::from_millis(5))
    }

    async fn wait_until(condition: impl Fn() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn delivers_on_first_attempt() {
        let sink = Arc::new(CountingSink::succeeding());
        let dispatcher = ReportDispatcher::spawn(sink.clone(), fast_policy());

        dispatcher.enqueue(report("s1"));
        wait_until(|| dispatcher.delivered_count() == 1).await;

        assert_eq!(sink.attempts(), 1);
        assert_eq!(dispatcher.failed_count(), 0);
        assert_eq!(sink.delivered()[0].session_id, "s1");
    }

    #[tokio::test]
    async fn retries_and_then_succeeds() {
        let sink = Arc::new(CountingSink::failing_times(2));
        let dispatcher = ReportDispatcher::spawn(sink.clone(), fast_policy());

        dispatcher.enqueue(report("s1"));
        wait_until(|| dispatcher.delivered_count() == 1).await;

        assert_eq!(sink.attempts(), 3);
        assert_eq!(dispatcher.failed_count(), 0);
    }

    #[tokio::test]
    async fn exhausted_retries_are_terminal_and_observable() {
        let sink = Arc::new(CountingSink::failing_times(u64::MAX));
        let dispatcher = ReportDispatcher::spawn(sink.clone(), fast_policy());

        dispatcher.enqueue(report("s1"));
        wait_until(|| dispatcher.failed_count() == 1).await;

        assert_eq!(sink.attempts(), 3);
        assert_eq!(dispatcher.delivered_count(), 0);
    }

    #[tokio::test]
    async fn custom_attempt_count_is_honored() {
        let sink = Arc::new(CountingSink::failing_times(u64::MAX));
        let policy = fast_policy().with_max_attempts(5);
        let dispatcher = ReportDispatcher::spawn(sink.clone(), policy);

        dispatcher.enqueue(report("s1"));
        wait_until(|| dispatcher.failed_count() == 1).await;

        assert_eq!(sink.attempts(), 5);
    }

    #[tokio::test]
    async fn queued_reports_are_processed_in_order() {
        let sink = Arc::new(CountingSink::succeeding());
        let dispatcher = ReportDispatcher::spawn(sink.clone(), fast_policy());

        dispatcher.enqueue(report("first"));
        dispatcher.enqueue(report("second"));
        wait_until(|| dispatcher.delivered_count() == 2).await;

        let delivered = sink.delivered();
        assert_eq!(delivered[0].session_id, "first");
        assert_eq!(delivered[1].session_id, "second");
    }

    #[tokio::test]
    async fn enqueue_returns_distinct_dispatch_ids() {
        let sink = Arc::new(CountingSink::succeeding());
        let dispatcher = ReportDispatcher::spawn(sink, fast_policy());

        let a = dispatcher.enqueue(report("s1"));
        let b = dispatcher.enqueue(report("s2"));
        assert_ne!(a, b);
    }
}
