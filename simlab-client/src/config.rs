//! Client configuration
//!
//! Connection settings, retry schedule and loop cadences, loadable from
//! environment variables.

use std::time::Duration;

use crate::error::{ClientError, Result};
use crate::retry::RetryPolicy;

/// Client configuration
///
/// All timeouts and intervals are configurable to allow tuning for
/// different deployments (local dev server vs remote, fast vs slow jobs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL (e.g., "http://localhost:5001")
    pub base_url: String,

    /// Upper bound for a single HTTP call
    pub request_timeout: Duration,

    /// Attempts per retried submission, including the first one
    pub retry_attempts: u32,

    /// Delay before the first retry; doubles on every further retry
    pub retry_base_delay: Duration,

    /// Wait between two status polls
    pub poll_interval: Duration,

    /// Wait between two log fetches once a log has caught up
    pub log_interval: Duration,
}

impl ClientConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:5001";

    /// Creates a new configuration with defaults
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(300),
            retry_attempts: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            retry_base_delay: RetryPolicy::DEFAULT_BASE_DELAY,
            poll_interval: Duration::from_millis(2000),
            log_interval: Duration::from_millis(1000),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognised environment variables (all optional):
    /// - SIMLAB_API_URL (default: http://localhost:5001)
    /// - SIMLAB_REQUEST_TIMEOUT (seconds, default: 300)
    /// - SIMLAB_RETRY_ATTEMPTS (default: 3)
    /// - SIMLAB_RETRY_BASE_DELAY_MS (default: 1000)
    /// - SIMLAB_POLL_INTERVAL_MS (default: 2000)
    /// - SIMLAB_LOG_INTERVAL_MS (default: 1000)
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::new(Self::DEFAULT_BASE_URL);

        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        let base_url = lookup("SIMLAB_API_URL").unwrap_or(defaults.base_url);

        let request_timeout = lookup("SIMLAB_REQUEST_TIMEOUT")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let retry_attempts = lookup("SIMLAB_RETRY_ATTEMPTS")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.retry_attempts);

        Self {
            base_url,
            request_timeout,
            retry_attempts,
            retry_base_delay: millis("SIMLAB_RETRY_BASE_DELAY_MS", defaults.retry_base_delay),
            poll_interval: millis("SIMLAB_POLL_INTERVAL_MS", defaults.poll_interval),
            log_interval: millis("SIMLAB_LOG_INTERVAL_MS", defaults.log_interval),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_log_interval(mut self, interval: Duration) -> Self {
        self.log_interval = interval;
        self
    }

    pub fn with_retry(mut self, attempts: u32, base_delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_base_delay = base_delay;
        self
    }

    /// Retry policy described by this configuration
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        RetryPolicy::new(self.retry_attempts, self.retry_base_delay)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(invalid("base_url cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(invalid("base_url must start with http:// or https://"));
        }

        if self.request_timeout.is_zero() {
            return Err(invalid("request_timeout must be greater than 0"));
        }

        if self.poll_interval.is_zero() {
            return Err(invalid("poll_interval must be greater than 0"));
        }

        if self.log_interval.is_zero() {
            return Err(invalid("log_interval must be greater than 0"));
        }

        self.retry_policy()?;

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL)
    }
}

fn invalid(message: &str) -> ClientError {
    ClientError::InvalidConfig(message.to_string())
}
