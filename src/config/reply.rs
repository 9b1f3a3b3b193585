//! Reply strategy configuration.

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Which reply strategy answers an engaged scammer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyBackend {
    /// Canned stalling lines; no external calls.
    #[default]
    Templates,
    /// Remote chat-completions delegate with template fallback.
    Llm,
}

/// Reply configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyConfig {
    /// Selected strategy.
    #[serde(default)]
    pub backend: ReplyBackend,

    /// API key for the LLM delegate, required for the llm backend.
    #[serde(default)]
    pub llm_api_key: Option<Secret<String>>,

    /// Model identifier for the LLM delegate.
    #[serde(default = "default_model")]
    pub llm_model: String,

    /// Base URL for the LLM delegate.
    #[serde(default = "default_base_url")]
    pub llm_base_url: String,

    /// Per-request timeout for the LLM delegate in seconds.
    #[serde(default = "default_llm_timeout")]
    pub llm_timeout_secs: u64,
}

impl ReplyConfig {
    /// Get the LLM timeout as a Duration.
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// Validate reply configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == ReplyBackend::Llm {
            match &self.llm_api_key {
                Some(key) if !key.expose_secret().is_empty() => {}
                _ => return Err(ValidationError::MissingLlmApiKey),
            }
        }
        Ok(())
    }
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            backend: ReplyBackend::default(),
            llm_api_key: None,
            llm_model: default_model(),
            llm_base_url: default_base_url(),
            llm_timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_timeout() -> u64 {
    10
}
