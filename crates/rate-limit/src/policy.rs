use std::time::Duration;

use throttlegate_common::{Error, RateLimitConfig, Result};

/// Immutable admission policy shared by every client key.
///
/// Construct through [`Policy::new`] or [`Policy::from_config`]; both reject
/// zero counts and zero durations so the request path never has to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    requests_per_window: u64,
    window: Duration,
    consecutive_limit_for_block: u64,
    block_duration: Duration,
    blocking_enabled: bool,
}

impl Policy {
    pub fn new(
        requests_per_window: u64,
        window: Duration,
        consecutive_limit_for_block: u64,
        block_duration: Duration,
        blocking_enabled: bool,
    ) -> Result<Self> {
        if requests_per_window == 0 {
            return Err(Error::Config(
                "requests_per_window must be at least 1".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(Error::Config("window duration must be positive".to_string()));
        }
        if consecutive_limit_for_block == 0 {
            return Err(Error::Config(
                "consecutive_limit_for_block must be at least 1".to_string(),
            ));
        }
        if block_duration.is_zero() {
            return Err(Error::Config("block duration must be positive".to_string()));
        }

        Ok(Self {
            requests_per_window,
            window,
            consecutive_limit_for_block,
            block_duration,
            blocking_enabled,
        })
    }

    /// Build a policy from the YAML-facing configuration section.
    pub fn from_config(config: &RateLimitConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            config.requests_per_window,
            Duration::from_secs(config.window_secs),
            config.consecutive_limit_for_block,
            Duration::from_secs(config.block_duration_minutes.saturating_mul(60)),
            config.enable_blocking,
        )
    }

    pub fn requests_per_window(&self) -> u64 {
        self.requests_per_window
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn consecutive_limit_for_block(&self) -> u64 {
        self.consecutive_limit_for_block
    }

    pub fn block_duration(&self) -> Duration {
        self.block_duration
    }

    pub fn blocking_enabled(&self) -> bool {
        self.blocking_enabled
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            requests_per_window: 6,
            window: Duration::from_secs(5),
            consecutive_limit_for_block: 3,
            block_duration: Duration::from_secs(15 * 60),
            blocking_enabled: false,
        }
    }
}
