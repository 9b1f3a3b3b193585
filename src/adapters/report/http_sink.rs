//! HTTP delivery of the final report to the downstream collector.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::domain::session::ScamReport;
use crate::ports::{ReportError, ReportSink};

/// POSTs the report payload to a configured collector endpoint.
///
/// One call is one attempt with a short timeout; any 2xx response counts as
/// delivered. Retries live in the dispatcher.
pub struct HttpReportSink {
    endpoint: String,
    client: Client,
    timeout: Duration,
}

impl HttpReportSink {
    /// Creates a sink for the given collector endpoint.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ReportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::network(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
            timeout,
        })
    }

    /// The configured collector endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReportSink for HttpReportSink {
    async fn deliver(&self, report: &ScamReport) -> Result<(), ReportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(report)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReportError::Timeout {
                        timeout_secs: self.timeout.as_secs(),
                    }
                } else {
                    ReportError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ReportError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

impl std::fmt::Debug for HttpReportSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpReportSink")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
