//! The one-time intelligence summary sent to the downstream collector.

use serde::{Deserialize, Serialize};

use crate::domain::intel::IntelBundle;
use crate::domain::session::SessionRecord;

/// Fixed analyst note attached to every report.
pub const AGENT_NOTES: &str =
    "Scammer used urgency, impersonation, and payment redirection tactics";

/// Immutable snapshot handed to the report dispatcher.
///
/// Built exactly once per session, at the moment termination is decided.
/// Field names match the collector's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScamReport {
    pub session_id: String,
    pub scam_detected: bool,
    pub total_messages_exchanged: u32,
    pub extracted_intelligence: IntelBundle,
    pub agent_notes: String,
}

impl ScamReport {
    /// Snapshots a session record into the outbound payload.
    pub fn from_record(record: &SessionRecord) -> Self {
        Self {
            session_id: record.session_id().as_str().to_string(),
            scam_detected: true,
            total_messages_exchanged: record.turns(),
            extracted_intelligence: record.intel().clone(),
            agent_notes: AGENT_NOTES.to_string(),
        }
    }
}
