use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Per-client admission control settings.
///
/// Every field is optional in the YAML source; missing fields take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_window")]
    pub requests_per_window: u64,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_consecutive_limit_for_block")]
    pub consecutive_limit_for_block: u64,
    #[serde(default = "default_block_duration_minutes")]
    pub block_duration_minutes: u64,
    #[serde(default)]
    pub enable_blocking: bool,
    /// Interval of the optional stale-entry sweep.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: default_requests_per_window(),
            window_secs: default_window_secs(),
            consecutive_limit_for_block: default_consecutive_limit_for_block(),
            block_duration_minutes: default_block_duration_minutes(),
            enable_blocking: false,
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl RateLimitConfig {
    /// Reject values that would make the limiter degenerate.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("rate_limit.requests_per_window", self.requests_per_window),
            ("rate_limit.window_secs", self.window_secs),
            (
                "rate_limit.consecutive_limit_for_block",
                self.consecutive_limit_for_block,
            ),
            ("rate_limit.block_duration_minutes", self.block_duration_minutes),
            ("rate_limit.cleanup_interval_secs", self.cleanup_interval_secs),
        ];

        for (field, value) in positive {
            if value == 0 {
                return Err(Error::Config(format!("{field} must be greater than zero")));
            }
        }

        Ok(())
    }
}

// Default value helpers
fn default_requests_per_window() -> u64 {
    6
}
fn default_window_secs() -> u64 {
    5
}
fn default_consecutive_limit_for_block() -> u64 {
    3
}
fn default_block_duration_minutes() -> u64 {
    15
}
fn default_cleanup_interval_secs() -> u64 {
    60
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading configuration file");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate an in-memory YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency.
    pub fn validate(&self) -> Result<()> {
        self.rate_limit.validate()
    }
}
