//! Session store configuration.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Which session store backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process map with TTL sweep. Single-instance only.
    #[default]
    Memory,
    /// External Redis with SET EX expiry.
    Redis,
}

/// Session store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Selected backend.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Redis connection URL, required for the redis backend.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Session time to live in seconds, refreshed on every write.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

impl StoreConfig {
    /// Get the session TTL as a Duration.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Validate store configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.session_ttl_secs == 0 {
            return Err(ValidationError::InvalidSessionTtl);
        }
        if self.backend == StoreBackend::Redis {
            match &self.redis_url {
                None => return Err(ValidationError::MissingRedisUrl),
                Some(url)
                    if !url.starts_with("redis://") && !url.starts_with("rediss://") =>
                {
                    return Err(ValidationError::InvalidRedisUrl)
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            redis_url: None,
            session_ttl_secs: default_session_ttl(),
        }
    }
}

/// Six hours from last write.
fn default_session_ttl() -> u64 {
    21_600
}
