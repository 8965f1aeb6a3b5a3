//! Configuration module
//!
//! Combines the environment-derived client settings with command-line
//! overrides.

use anyhow::{Context, Result};
use simlab_client::{ClientConfig, SimlabClient};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Settings of the API client
    pub client: ClientConfig,
    /// Cancelled on Ctrl-C
    pub cancel: CancellationToken,
}

impl Config {
    /// Reads `SIMLAB_*` variables, then applies the flags given on the
    /// command line
    pub fn from_env(
        api_url: String,
        retry_attempts: Option<u32>,
        poll_interval_ms: Option<u64>,
        cancel: CancellationToken,
    ) -> Self {
        Self::with_overrides(
            ClientConfig::from_env(),
            api_url,
            retry_attempts,
            poll_interval_ms,
            cancel,
        )
    }

    fn with_overrides(
        mut client: ClientConfig,
        api_url: String,
        retry_attempts: Option<u32>,
        poll_interval_ms: Option<u64>,
        cancel: CancellationToken,
    ) -> Self {
        client.base_url = api_url;
        if let Some(attempts) = retry_attempts {
            client.retry_attempts = attempts;
        }
        if let Some(ms) = poll_interval_ms {
            client.poll_interval = Duration::from_millis(ms);
        }

        Self { client, cancel }
    }

    /// Builds the API client, rejecting invalid settings
    pub fn client(&self) -> Result<SimlabClient> {
        SimlabClient::from_config(&self.client).context("Invalid client configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_environment() {
        let env = ClientConfig::default().with_retry(3, Duration::from_millis(1000));
        let config = Config::with_overrides(
            env,
            "http://sim:9000".to_string(),
            Some(6),
            Some(250),
            CancellationToken::new(),
        );

        assert_eq!(config.client.base_url, "http://sim:9000");
        assert_eq!(config.client.retry_attempts, 6);
        assert_eq!(config.client.poll_interval, Duration::from_millis(250));

        let client = config.client().unwrap();
        assert_eq!(client.retry_policy().max_attempts(), 6);
    }

    #[test]
    fn test_invalid_overrides_are_rejected() {
        let config = Config::with_overrides(
            ClientConfig::default(),
            "http://sim:9000".to_string(),
            Some(0),
            None,
            CancellationToken::new(),
        );

        assert!(config.client().is_err());
    }
}
