//! Report delivery configuration.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Report delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Downstream collector endpoint.
    pub collector_url: String,

    /// Per-attempt timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Total delivery attempts per report, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed pause between attempts in seconds.
    #[serde(default = "default_retry_pause")]
    pub retry_pause_secs: u64,
}

impl ReportConfig {
    /// Get the per-attempt timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the retry pause as a Duration.
    pub fn retry_pause(&self) -> Duration {
        Duration::from_secs(self.retry_pause_secs)
    }

    /// Validate report configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.collector_url.is_empty() {
            return Err(ValidationError::MissingRequired("REPORT_COLLECTOR_URL"));
        }
        if !self.collector_url.starts_with("http://")
            && !self.collector_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidCollectorUrl);
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidRetryAttempts);
        }
        if self.timeout_secs == 0 || self.timeout_secs > 60 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    5
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_pause() -> u64 {
    1
}
