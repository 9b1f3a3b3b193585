//! The per-message session core.
//!
//! One call to [`SessionOrchestrator::handle_message`] is one turn: load the
//! record, advance counters, check the trigger, merge extracted artifacts,
//! produce a reply, maybe close the session and queue its one report, then
//! persist. Turns for the same session are serialized through a per-key
//! lock; distinct sessions proceed concurrently.
//!
//! Nothing in here ever fails the request. Store errors divert to a
//! process-local fallback store, delegate errors divert to the fallback
//! reply pool, and report delivery runs detached from the request path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::ReportDispatcher;
use crate::domain::foundation::SessionId;
use crate::domain::intel::IntelExtractor;
use crate::domain::session::{
    EngagementPhase, EngagementPolicy, ScamReport, SessionRecord, CONNECTION_LOST_REPLY,
    DORMANT_REPLY,
};
use crate::ports::{InboundMessage, ReplyStrategy, SessionStore};

/// Played when even the fallback reply source fails.
const LAST_RESORT_REPLY: &str = "Can you send the details again?";

/// Orchestrator knobs that are not engagement policy.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Time to live for a session record, refreshed on every write.
    pub session_ttl: Duration,
    /// Most recent history messages passed to the reply delegate.
    pub history_window: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(6 * 60 * 60),
            history_window: 6,
        }
    }
}

/// Composes extractor, policy, stores, reply strategies and the report
/// dispatcher into the request-handling core.
pub struct SessionOrchestrator {
    store: Arc<dyn SessionStore>,
    fallback_store: Arc<dyn SessionStore>,
    reply_strategy: Arc<dyn ReplyStrategy>,
    fallback_replies: Arc<dyn ReplyStrategy>,
    dispatcher: ReportDispatcher,
    extractor: IntelExtractor,
    policy: EngagementPolicy,
    settings: SessionSettings,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionOrchestrator {
    /// Creates an orchestrator with the default extractor, policy and
    /// settings. `fallback_store` must be a process-local store; it is only
    /// consulted when `store` errors.
    pub fn new(
        store: Arc<dyn SessionStore>,
        fallback_store: Arc<dyn SessionStore>,
        reply_strategy: Arc<dyn ReplyStrategy>,
        fallback_replies: Arc<dyn ReplyStrategy>,
        dispatcher: ReportDispatcher,
    ) -> Self {
        Self {
            store,
            fallback_store,
            reply_strategy,
            fallback_replies,
            dispatcher,
            extractor: IntelExtractor::new(),
            policy: EngagementPolicy::new(),
            settings: SessionSettings::default(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the engagement policy.
    pub fn with_policy(mut self, policy: EngagementPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the extractor.
    pub fn with_extractor(mut self, extractor: IntelExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replaces the settings.
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Processes one inbound message and returns the outgoing reply.
    ///
    /// The whole read-modify-write for the session happens under that
    /// session's lock, so concurrent deliveries for the same id cannot lose
    /// counter updates or set unions.
    pub async fn handle_message(
        &self,
        session_id: SessionId,
        message: InboundMessage,
        history: Vec<InboundMessage>,
    ) -> String {
        let lock = self.lock_for(&session_id);
        let reply = {
            let _guard = lock.lock().await;
            self.process_turn(&session_id, &message, &history).await
        };
        self.release_lock(&session_id, &lock);
        reply
    }

    async fn process_turn(
        &self,
        session_id: &SessionId,
        message: &InboundMessage,
        history: &[InboundMessage],
    ) -> String {
        let mut record = self.load(session_id).await;
        let turn = record.begin_turn();

        if !record.scam_detected() && self.policy.is_triggered(&message.text) {
            record.mark_scam_detected();
            tracing::info!(session_id = %session_id, turn, "scam trigger fired");
        }

        let delta = self.extractor.extract(&message.text);
        let novel = record.record_extraction(&delta);
        tracing::debug!(
            session_id = %session_id,
            turn,
            novel,
            stalled_turns = record.stalled_turns(),
            artifacts = record.intel().len(),
            "intelligence merged"
        );

        // Closed sessions keep getting bait replies; only the one closing
        // turn overrides with the connection-lost line below.
        let mut reply = match EngagementPhase::of(&record) {
            EngagementPhase::Dormant => DORMANT_REPLY.to_string(),
            EngagementPhase::Engaged | EngagementPhase::Closed => {
                self.bait_reply(message, history).await
            }
        };

        if self.policy.should_close(&record) && !record.report_sent() {
            record.mark_report_sent();
            let report = ScamReport::from_record(&record);
            let dispatch_id = self.dispatcher.enqueue(report);
            reply = CONNECTION_LOST_REPLY.to_string();
            tracing::info!(
                session_id = %session_id,
                turn,
                dispatch_id = %dispatch_id,
                artifacts = record.intel().len(),
                "session closed, report queued"
            );
        }

        self.persist(&record).await;
        reply
    }

    /// Loads the session record, falling back to the local store on backend
    /// errors and to a fresh record for unseen sessions.
    async fn load(&self, session_id: &SessionId) -> SessionRecord {
        match self.store.get(session_id).await {
            Ok(Some(record)) => record,
            Ok(None) => SessionRecord::new(session_id.clone()),
            Err(error) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %error,
                    "session store read failed, using local fallback"
                );
                match self.fallback_store.get(session_id).await {
                    Ok(Some(record)) => record,
                    Ok(None) => SessionRecord::new(session_id.clone()),
                    Err(error) => {
                        tracing::error!(
                            session_id = %session_id,
                            error = %error,
                            "local fallback read failed, starting fresh record"
                        );
                        SessionRecord::new(session_id.clone())
                    }
                }
            }
        }
    }

    /// Persists the record, falling back to the local store on backend
    /// errors. Write failures never surface to the caller.
    async fn persist(&self, record: &SessionRecord) {
        if let Err(error) = self.store.put(record, self.settings.session_ttl).await {
            tracing::warn!(
                session_id = %record.session_id(),
                error = %error,
                "session store write failed, caching locally"
            );
            if let Err(error) = self
                .fallback_store
                .put(record, self.settings.session_ttl)
                .await
            {
                tracing::error!(
                    session_id = %record.session_id(),
                    error = %error,
                    "local fallback write failed, turn state lost"
                );
            }
        }
    }

    /// Asks the delegate for a bait line, bounding history to the most
    /// recent window; substitutes a stall line on any delegate failure.
    async fn bait_reply(&self, current: &InboundMessage, history: &[InboundMessage]) -> String {
        let window_start = history.len().saturating_sub(self.settings.history_window);
        let bounded = &history[window_start..];

        match self.reply_strategy.compose(current, bounded).await {
            Ok(reply) => reply,
            Err(error) => {
                tracing::warn!(error = %error, "reply delegate failed, substituting stall line");
                match self.fallback_replies.compose(current, bounded).await {
                    Ok(reply) => reply,
                    Err(error) => {
                        tracing::error!(error = %error, "fallback reply source failed");
                        LAST_RESORT_REPLY.to_string()
                    }
                }
            }
        }
    }

    /// Fetches (or creates) the serialization lock for a session.
    fn lock_for(&self, session_id: &SessionId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(session_id.as_str().to_string())
            .or_default()
            .clone()
    }

    /// Drops the lock entry once no other turn is waiting on it, so the map
    /// does not grow with every session ever seen.
    fn release_lock(&self, session_id: &SessionId, lock: &Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Two strong references mean map + us; anything more is a waiter.
        if Arc::strong_count(lock) <= 2 {
            locks.remove(session_id.as_str());
        }
    }
}

impl std::fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOrchestrator")
            .field("policy", &self.policy)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::reply::TemplatePool;
    use crate::adapters::store::InMemorySessionStore;
    use crate::application::RetryPolicy;
    use crate::ports::{ReplyError, ReportError, ReportSink, StoreError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FlakyStore {
        inner: InMemorySessionStore,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
    }

    impl FlakyStore {
        fn healthy() -> Self {
            Self {
                inner: InMemorySessionStore::new(),
                fail_reads: AtomicBool::new(false),
                fail_writes: AtomicBool::new(false),
            }
        }

        fn broken() -> Self {
            let store = Self::healthy();
            store.fail_reads.store(true, Ordering::Relaxed);
            store.fail_writes.store(true, Ordering::Relaxed);
            store
        }
    }

    #[async_trait]
    impl SessionStore for FlakyStore {
        async fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
            if self.fail_reads.load(Ordering::Relaxed) {
                return Err(StoreError::unavailable("simulated outage"));
            }
            self.inner.get(id).await
        }

        async fn put(&self, record: &SessionRecord, ttl: Duration) -> Result<(), StoreError> {
            if self.fail_writes.load(Ordering::Relaxed) {
                return Err(StoreError::unavailable("simulated outage"));
            }
            self.inner.put(record, ttl).await
        }
    }

    struct ScriptedReply {
        line: String,
        fail: bool,
        seen_history_lens: Mutex<Vec<usize>>,
    }

    impl ScriptedReply {
        fn saying(line: &str) -> Self {
            Self {
                line: line.to_string(),
                fail: false,
                seen_history_lens: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                line: String::new(),
                fail: true,
                seen_history_lens: Mutex::new(Vec::new()),
            }
        }

        fn history_lens(&self) -> Vec<usize> {
            self.seen_history_lens.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReplyStrategy for ScriptedReply {
        async fn compose(
            &self,
            _current: &InboundMessage,
            history: &[InboundMessage],
        ) -> Result<String, ReplyError> {
            self.seen_history_lens.lock().unwrap().push(history.len());
            if self.fail {
                return Err(ReplyError::unavailable("simulated delegate outage"));
            }
            Ok(self.line.clone())
        }
    }

    struct RecordingSink {
        reports: Mutex<Vec<ScamReport>>,
        deliveries: AtomicUsize,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                reports: Mutex::new(Vec::new()),
                deliveries: AtomicUsize::new(0),
            }
        }

        fn reports(&self) -> Vec<ScamReport> {
            self.reports.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReportSink for RecordingSink {
        async fn deliver(&self, report: &ScamReport) -> Result<(), ReportError> {
            self.reports.lock().unwrap().push(report.clone());
            self.deliveries.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    struct Harness {
        orchestrator: Arc<SessionOrchestrator>,
        store: Arc<FlakyStore>,
        fallback: Arc<InMemorySessionStore>,
        sink: Arc<RecordingSink>,
        dispatcher: ReportDispatcher,
    }

    fn harness_with(store: FlakyStore, reply: Arc<dyn ReplyStrategy>) -> Harness {
        let store = Arc::new(store);
        let fallback = Arc::new(InMemorySessionStore::new());
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = ReportDispatcher::spawn(
            sink.clone(),
            RetryPolicy::default().with_pause(Duration::from_millis(1)),
        );
        let orchestrator = Arc::new(SessionOrchestrator::new(
            store.clone(),
            fallback.clone(),
            reply,
            Arc::new(TemplatePool::seeded(11)),
            dispatcher.clone(),
        ));
        Harness {
            orchestrator,
            store,
            fallback,
            sink,
            dispatcher,
        }
    }

    fn harness() -> Harness {
        harness_with(FlakyStore::healthy(), Arc::new(ScriptedReply::saying("ok?")))
    }

    fn msg(text: &str) -> InboundMessage {
        InboundMessage::new("scammer", text, 0)
    }

    fn sid(id: &str) -> SessionId {
        SessionId::new(id).unwrap()
    }

    async fn drain_dispatcher(h: &Harness, expected: u64) {
        for _ in 0..200 {
            if h.dispatcher.delivered_count() + h.dispatcher.failed_count() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("dispatcher did not drain in time");
    }

    #[tokio::test]
    async fn first_message_creates_record_and_answers_neutrally() {
        let h = harness();
        let reply = h
            .orchestrator
            .handle_message(sid("s1"), msg("hello there"), vec![])
            .await;

        assert_eq!(reply, DORMANT_REPLY);
        let record = h.store.inner.get(&sid("s1")).await.unwrap().unwrap();
        assert_eq!(record.turns(), 1);
        assert!(!record.scam_detected());
    }

    #[tokio::test]
    async fn trigger_phrase_engages_the_session() {
        let h = harness();
        let reply = h
            .orchestrator
            .handle_message(sid("s1"), msg("your account is blocked, verify otp"), vec![])
            .await;

        assert_eq!(reply, "ok?");
        let record = h.store.inner.get(&sid("s1")).await.unwrap().unwrap();
        assert!(record.scam_detected());
    }

    #[tokio::test]
    async fn engagement_survives_benign_followups() {
        let h = harness();
        h.orchestrator
            .handle_message(sid("s1"), msg("verify otp now"), vec![])
            .await;
        h.orchestrator
            .handle_message(sid("s1"), msg("nice weather today"), vec![])
            .await;

        let record = h.store.inner.get(&sid("s1")).await.unwrap().unwrap();
        assert!(record.scam_detected());
        assert_eq!(record.turns(), 2);
    }

    #[tokio::test]
    async fn extraction_runs_even_while_dormant() {
        let h = harness();
        // No trigger word, but a handle is present.
        h.orchestrator
            .handle_message(sid("s1"), msg("send to someone@okbank"), vec![])
            .await;

        let record = h.store.inner.get(&sid("s1")).await.unwrap().unwrap();
        assert!(!record.scam_detected());
        assert!(record.intel().upi_ids.contains("someone@okbank"));
    }

    #[tokio::test]
    async fn delegate_failure_substitutes_a_stall_line() {
        let h = harness_with(FlakyStore::healthy(), Arc::new(ScriptedReply::failing()));
        let reply = h
            .orchestrator
            .handle_message(sid("s1"), msg("verify otp"), vec![])
            .await;

        assert!(crate::adapters::reply::DEFAULT_STALL_LINES.contains(&reply.as_str()));
    }

    #[tokio::test]
    async fn history_is_bounded_to_the_window() {
        let reply = Arc::new(ScriptedReply::saying("ok?"));
        let h = harness_with(FlakyStore::healthy(), reply.clone());

        let history: Vec<InboundMessage> =
            (0..10).map(|i| InboundMessage::new("scammer", "old", i)).collect();
        h.orchestrator
            .handle_message(sid("s1"), msg("verify otp"), history)
            .await;

        assert_eq!(reply.history_lens(), vec![6]);
    }

    #[tokio::test]
    async fn store_outage_never_fails_the_request() {
        let h = harness_with(FlakyStore::broken(), Arc::new(ScriptedReply::saying("ok?")));
        let reply = h
            .orchestrator
            .handle_message(sid("s1"), msg("hello"), vec![])
            .await;

        assert_eq!(reply, DORMANT_REPLY);
        // Turn state survived in the local fallback.
        let record = h.fallback.get(&sid("s1")).await.unwrap().unwrap();
        assert_eq!(record.turns(), 1);
    }

    #[tokio::test]
    async fn fallback_preserves_state_across_outage_turns() {
        let h = harness_with(FlakyStore::broken(), Arc::new(ScriptedReply::saying("ok?")));
        h.orchestrator
            .handle_message(sid("s1"), msg("verify otp"), vec![])
            .await;
        h.orchestrator
            .handle_message(sid("s1"), msg("hello again"), vec![])
            .await;

        let record = h.fallback.get(&sid("s1")).await.unwrap().unwrap();
        assert_eq!(record.turns(), 2);
        assert!(record.scam_detected());
    }

    #[tokio::test]
    async fn session_closes_at_the_turn_ceiling() {
        let h = harness();
        let mut last_reply = String::new();
        for i in 0..18 {
            last_reply = h
                .orchestrator
                .handle_message(sid("s1"), msg(&format!("hello {}", i)), vec![])
                .await;
        }

        assert_eq!(last_reply, CONNECTION_LOST_REPLY);
        drain_dispatcher(&h, 1).await;

        let reports = h.sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].total_messages_exchanged, 18);
        assert!(reports[0].extracted_intelligence.upi_ids.is_empty());
    }

    #[tokio::test]
    async fn stall_with_critical_data_closes_the_session() {
        let h = harness();
        // Four empty turns, then the handle, then stale repeats.
        for i in 0..4 {
            h.orchestrator
                .handle_message(sid("s1"), msg(&format!("hello {}", i)), vec![])
                .await;
        }
        h.orchestrator
            .handle_message(sid("s1"), msg("send it to pay@upi"), vec![])
            .await;

        let mut replies = Vec::new();
        for _ in 0..4 {
            replies.push(
                h.orchestrator
                    .handle_message(sid("s1"), msg("send it to pay@upi"), vec![])
                    .await,
            );
        }

        // Stall counter hits the limit on the fourth stale repeat.
        assert_ne!(replies[2], CONNECTION_LOST_REPLY);
        assert_eq!(replies[3], CONNECTION_LOST_REPLY);

        drain_dispatcher(&h, 1).await;
        let reports = h.sink.reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].extracted_intelligence.upi_ids.contains("pay@upi"));
    }

    #[tokio::test]
    async fn report_is_sent_at_most_once() {
        let h = harness();
        for i in 0..25 {
            h.orchestrator
                .handle_message(sid("s1"), msg(&format!("verify otp {}", i)), vec![])
                .await;
        }

        drain_dispatcher(&h, 1).await;
        assert_eq!(h.sink.reports().len(), 1);

        let record = h.store.inner.get(&sid("s1")).await.unwrap().unwrap();
        assert!(record.report_sent());
        assert_eq!(record.turns(), 25);
    }

    #[tokio::test]
    async fn closed_session_keeps_replying_via_delegate() {
        let h = harness();
        for i in 0..18 {
            h.orchestrator
                .handle_message(sid("s1"), msg(&format!("verify otp {}", i)), vec![])
                .await;
        }

        let reply = h
            .orchestrator
            .handle_message(sid("s1"), msg("are you still there"), vec![])
            .await;
        assert_eq!(reply, "ok?");
    }

    #[tokio::test]
    async fn concurrent_turns_for_one_session_are_serialized() {
        let h = harness();
        let mut handles = Vec::new();
        for i in 0..12 {
            let orchestrator = h.orchestrator.clone();
            handles.push(tokio::spawn(async move {
                orchestrator
                    .handle_message(sid("s1"), msg(&format!("hello {}", i)), vec![])
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = h.store.inner.get(&sid("s1")).await.unwrap().unwrap();
        assert_eq!(record.turns(), 12);
    }

    #[tokio::test]
    async fn sessions_do_not_share_state() {
        let h = harness();
        h.orchestrator
            .handle_message(sid("a"), msg("verify otp"), vec![])
            .await;
        h.orchestrator
            .handle_message(sid("b"), msg("hello"), vec![])
            .await;

        let a = h.store.inner.get(&sid("a")).await.unwrap().unwrap();
        let b = h.store.inner.get(&sid("b")).await.unwrap().unwrap();
        assert!(a.scam_detected());
        assert!(!b.scam_detected());
    }

    #[tokio::test]
    async fn lock_map_does_not_accumulate_idle_sessions() {
        let h = harness();
        for i in 0..5 {
            h.orchestrator
                .handle_message(sid(&format!("s{}", i)), msg("hello"), vec![])
                .await;
        }
        let locks = h.orchestrator.locks.lock().unwrap();
        assert!(locks.is_empty());
    }
}
