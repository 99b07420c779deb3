//! Queue configuration.

use std::time::Duration;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Long-poll timeout used when the caller does not pass one
    pub default_wait_timeout: Duration,
    /// Upper bound applied to caller-supplied long-poll timeouts
    pub max_wait_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            default_wait_timeout: Duration::from_secs(30),
            max_wait_timeout: Duration::from_secs(30),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let default_wait_timeout = Duration::from_secs(
            std::env::var("JOB_WAIT_DEFAULT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        );
        let max_wait_timeout = Duration::from_secs(
            std::env::var("JOB_WAIT_MAX_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        );

        Self {
            default_wait_timeout: default_wait_timeout.min(max_wait_timeout),
            max_wait_timeout,
        }
    }

    /// Resolve a caller-supplied long-poll timeout.
    pub fn wait_timeout(&self, requested: Option<Duration>) -> Duration {
        requested
            .unwrap_or(self.default_wait_timeout)
            .min(self.max_wait_timeout)
    }
}
