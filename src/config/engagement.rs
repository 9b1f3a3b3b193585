//! Engagement policy configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// Engagement policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngagementConfig {
    /// Hard ceiling on processed turns before the session closes.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Consecutive no-novelty turns tolerated once critical data is held.
    #[serde(default = "default_stall_limit")]
    pub stall_limit: u32,

    /// Whether a phone number alone counts as critical data for the
    /// stall-based close. The canonical policy says no; one revision of the
    /// upstream behavior says yes, so it is a flag rather than a constant.
    #[serde(default)]
    pub count_phones_as_critical: bool,

    /// Most recent history messages forwarded to the reply delegate.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl EngagementConfig {
    /// Validate engagement configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_turns == 0 || self.stall_limit == 0 {
            return Err(ValidationError::InvalidEngagementLimits);
        }
        Ok(())
    }
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            stall_limit: default_stall_limit(),
            count_phones_as_critical: false,
            history_window: default_history_window(),
        }
    }
}

fn default_max_turns() -> u32 {
    18
}

fn default_stall_limit() -> u32 {
    4
}

fn default_history_window() -> usize {
    6
}
