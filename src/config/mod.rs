//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment
//! variables using the `config` and `dotenvy` crates. Configuration is
//! loaded with the `BAITLINE_` prefix and nested values use double
//! underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use baitline::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod engagement;
mod error;
mod reply;
mod report;
mod server;
mod store;

pub use engagement::EngagementConfig;
pub use error::{ConfigError, ValidationError};
pub use reply::{ReplyBackend, ReplyConfig};
pub use report::ReportConfig;
pub use server::{Environment, ServerConfig};
pub use store::{StoreBackend, StoreConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the baitline service.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, API key).
    pub server: ServerConfig,

    /// Session store configuration (memory or Redis).
    #[serde(default)]
    pub store: StoreConfig,

    /// Reply strategy configuration (templates or LLM delegate).
    #[serde(default)]
    pub reply: ReplyConfig,

    /// Report delivery configuration (collector endpoint, retries).
    pub report: ReportConfig,

    /// Engagement policy configuration (turn ceiling, stall limit).
    #[serde(default)]
    pub engagement: EngagementConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `BAITLINE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `BAITLINE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BAITLINE__REPORT__COLLECTOR_URL=...` -> `report.collector_url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required environment variables are missing
    /// or values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BAITLINE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.store.validate()?;
        self.reply.validate()?;
        self.report.validate()?;
        self.engagement.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
