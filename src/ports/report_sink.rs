//! Report delivery port.
//!
//! One call is one delivery attempt; the retry loop around it belongs to the
//! dispatcher. At-most-once per session is enforced by the orchestrator via
//! the record's report-sent flag, not by implementations of this trait.

use async_trait::async_trait;

use crate::domain::session::ScamReport;

/// Port for delivering a report to the downstream collector.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Attempts to deliver the report once.
    async fn deliver(&self, report: &ScamReport) -> Result<(), ReportError>;
}

/// Errors a delivery attempt can produce.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The collector did not answer within the attempt deadline.
    #[error("report delivery timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The collector answered outside the success range.
    #[error("collector rejected report with status {status}")]
    Rejected { status: u16 },

    /// The collector could not be reached.
    #[error("report delivery failed: {0}")]
    Network(String),
}

impl ReportError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        ReportError::Network(message.into())
    }
}
