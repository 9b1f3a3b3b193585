//! The per-conversation session record.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::intel::{ExtractedIntel, IntelBundle};

/// One record per conversation, keyed by the opaque session identifier.
///
/// Invariants maintained here:
/// - the turn count only increases, by exactly one per inbound message;
/// - `scam_detected` and `report_sent` are set-once and never cleared;
/// - every intelligence set only grows until the record expires;
/// - the stall counter resets to zero on any turn with novel intelligence
///   and otherwise increments by one.
///
/// Records are created on the first message of an unseen session, mutated
/// exactly once per inbound message, and removed only by the store's own
/// expiry. Nothing in the service deletes a record explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    session_id: SessionId,
    turns: u32,
    scam_detected: bool,
    report_sent: bool,
    stalled_turns: u32,
    intel: IntelBundle,
    first_seen: Timestamp,
    last_seen: Timestamp,
}

impl SessionRecord {
    /// Creates a fresh record with all counters at their defaults.
    pub fn new(session_id: SessionId) -> Self {
        let now = Timestamp::now();
        Self {
            session_id,
            turns: 0,
            scam_detected: false,
            report_sent: false,
            stalled_turns: 0,
            intel: IntelBundle::new(),
            first_seen: now,
            last_seen: now,
        }
    }

    /// Advances the turn counter for one inbound message.
    pub fn begin_turn(&mut self) -> u32 {
        self.turns += 1;
        self.last_seen = Timestamp::now();
        self.turns
    }

    /// Latches the scam-triggered flag. Once set it stays set.
    pub fn mark_scam_detected(&mut self) {
        self.scam_detected = true;
    }

    /// Latches the report-sent flag. Once set, no second report may ever be
    /// dispatched for this session.
    pub fn mark_report_sent(&mut self) {
        self.report_sent = true;
    }

    /// Merges one message's extracted candidates and updates the stall
    /// counter: reset on novelty, incremented otherwise.
    ///
    /// Returns true iff the turn produced novel intelligence.
    pub fn record_extraction(&mut self, delta: &ExtractedIntel) -> bool {
        let novel = self.intel.absorb(delta);
        if novel {
            self.stalled_turns = 0;
        } else {
            self.stalled_turns += 1;
        }
        novel
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn scam_detected(&self) -> bool {
        self.scam_detected
    }

    pub fn report_sent(&self) -> bool {
        self.report_sent
    }

    pub fn stalled_turns(&self) -> u32 {
        self.stalled_turns
    }

    pub fn intel(&self) -> &IntelBundle {
        &self.intel
    }

    pub fn first_seen(&self) -> &Timestamp {
        &self.first_seen
    }

    pub fn last_seen(&self) -> &Timestamp {
        &self.last_seen
    }
}
