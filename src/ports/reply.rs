//! Reply generation port.
//!
//! "Produce an outgoing utterance given the current text and bounded
//! history." Whether that is a canned line or a remote language-model call
//! is an adapter concern; a failing delegate is always recoverable by
//! substituting a fallback utterance.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One message of the conversation as the transport delivers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Sender label assigned by the transport (e.g. "scammer").
    pub sender: String,
    /// Raw message text.
    pub text: String,
    /// Transport timestamp, Unix milliseconds.
    pub timestamp: i64,
}

impl InboundMessage {
    /// Creates a new message.
    pub fn new(sender: impl Into<String>, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            timestamp,
        }
    }
}

/// Port for producing the next bait utterance.
#[async_trait]
pub trait ReplyStrategy: Send + Sync {
    /// Composes a reply to `current`, given the most recent history.
    ///
    /// History is already bounded by the caller; implementations must not
    /// assume more context than what they are handed.
    async fn compose(
        &self,
        current: &InboundMessage,
        history: &[InboundMessage],
    ) -> Result<String, ReplyError>;
}

/// Errors a reply delegate can produce.
#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    /// The delegate did not answer within its deadline.
    #[error("reply delegate timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The delegate is unreachable or rejected the request.
    #[error("reply delegate unavailable: {0}")]
    Unavailable(String),

    /// The delegate answered with something unusable.
    #[error("reply delegate returned unusable output: {0}")]
    Malformed(String),
}

impl ReplyError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        ReplyError::Unavailable(message.into())
    }

    /// Creates a malformed-output error.
    pub fn malformed(message: impl Into<String>) -> Self {
        ReplyError::Malformed(message.into())
    }
}
