//! The engagement state machine.
//!
//! A session moves Dormant → Engaged → Closed, one direction only. Dormant
//! sessions answer with a fixed neutral line; Engaged sessions bait via the
//! reply delegate; Closed sessions have had their one report queued and were
//! signed off with a staged connection failure.

use crate::domain::session::SessionRecord;

/// Fixed reply while the session is still Dormant.
pub const DORMANT_REPLY: &str = "Hello? Who is this?";

/// Fixed reply sent exactly once, at the moment the report is queued, to end
/// the exchange abruptly but plausibly.
pub const CONNECTION_LOST_REPLY: &str = "Network error. Connection lost.";

/// Default trigger vocabulary, matched lowercased by containment.
pub const DEFAULT_TRIGGER_WORDS: &[&str] = &[
    "blocked", "verify", "otp", "upi", "pay", "link", "kyc", "suspend", "suspended",
];

/// The three phases of a session's lifetime.
///
/// Derived from the record's two set-once flags, so the phase inherits their
/// monotonicity: no phase is ever revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementPhase {
    /// No scam trigger observed yet.
    Dormant,
    /// Trigger fired; bait replies are being generated.
    Engaged,
    /// The report has been queued; the exchange is over.
    Closed,
}

impl EngagementPhase {
    /// Reads the phase off a session record.
    pub fn of(record: &SessionRecord) -> Self {
        if record.report_sent() {
            EngagementPhase::Closed
        } else if record.scam_detected() {
            EngagementPhase::Engaged
        } else {
            EngagementPhase::Dormant
        }
    }
}

/// Decides trigger activation and termination for a session.
#[derive(Debug, Clone)]
pub struct EngagementPolicy {
    /// Lowercased trigger vocabulary.
    trigger_words: Vec<String>,
    /// Hard ceiling on processed turns before the session closes.
    pub max_turns: u32,
    /// Consecutive no-novelty turns tolerated once critical data is in hand.
    pub stall_limit: u32,
    /// Whether a phone number alone counts as critical data.
    pub count_phones_as_critical: bool,
}

impl Default for EngagementPolicy {
    fn default() -> Self {
        Self {
            trigger_words: DEFAULT_TRIGGER_WORDS.iter().map(|w| w.to_string()).collect(),
            max_turns: 18,
            stall_limit: 4,
            count_phones_as_critical: false,
        }
    }
}

impl EngagementPolicy {
    /// Creates the canonical policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the trigger vocabulary. Words are stored lowercased.
    pub fn with_trigger_words(mut self, words: Vec<String>) -> Self {
        self.trigger_words = words.into_iter().map(|w| w.to_lowercase()).collect();
        self
    }

    /// Sets the turn ceiling.
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Sets the stall limit.
    pub fn with_stall_limit(mut self, stall_limit: u32) -> Self {
        self.stall_limit = stall_limit;
        self
    }

    /// Sets whether phone numbers alone count as critical data.
    pub fn with_phones_as_critical(mut self, count: bool) -> Self {
        self.count_phones_as_critical = count;
        self
    }

    /// True iff the message contains any trigger word, case-insensitively.
    ///
    /// Only consulted while the session is still Dormant; the flag it sets
    /// is never cleared.
    pub fn is_triggered(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.trigger_words.iter().any(|w| lowered.contains(w.as_str()))
    }

    /// True iff the session should close this turn: either the turn ceiling
    /// is reached, or critical data is in hand and the correspondent has
    /// stalled for too long.
    pub fn should_close(&self, record: &SessionRecord) -> bool {
        record.turns() >= self.max_turns
            || (record.intel().has_critical_data(self.count_phones_as_critical)
                && record.stalled_turns() >= self.stall_limit)
    }
}
