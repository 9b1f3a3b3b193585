//! Session persistence port.
//!
//! The core only needs get/put-with-ttl semantics keyed by session id. A
//! failing backend must never fail a request: the orchestrator catches
//! [`StoreError`] and falls back to a process-local store explicitly.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::foundation::SessionId;
use crate::domain::session::SessionRecord;

/// Port for session record persistence.
///
/// Implementations should be thread-safe and support concurrent access.
/// Expiry is the store's responsibility: `put` refreshes the record's TTL,
/// and an expired record reads back as `None`. The core never deletes.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the record for a session, `None` if unseen or expired.
    async fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError>;

    /// Writes a record, (re)setting its time to live.
    async fn put(&self, record: &SessionRecord, ttl: Duration) -> Result<(), StoreError>;
}

/// Errors a persistence backend can produce.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend cannot be reached or refused the operation.
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be decoded.
    #[error("corrupt record for session {session_id}: {reason}")]
    Corrupt { session_id: String, reason: String },
}

impl StoreError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable(message.into())
    }

    /// Creates a corrupt-record error.
    pub fn corrupt(session_id: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Corrupt {
            session_id: session_id.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_displays_backend_message() {
        let err = StoreError::unavailable("connection refused");
        assert_eq!(
            err.to_string(),
            "session store unavailable: connection refused"
        );
    }

    #[test]
    fn corrupt_names_the_session() {
        let err = StoreError::corrupt("s-1", "invalid json");
        assert_eq!(err.to_string(), "corrupt record for session s-1: invalid json");
    }
}
