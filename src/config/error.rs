//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Redis backend selected but no Redis URL configured")]
    MissingRedisUrl,

    #[error("Invalid session TTL")]
    InvalidSessionTtl,

    #[error("Invalid collector URL format")]
    InvalidCollectorUrl,

    #[error("Report retry attempts must be at least 1")]
    InvalidRetryAttempts,

    #[error("LLM reply backend selected but no API key configured")]
    MissingLlmApiKey,

    #[error("Turn and stall limits must be at least 1")]
    InvalidEngagementLimits,
}
