//! Retry with exponential backoff
//!
//! Wraps a single remote call and repeats it on failure. The delay before
//! retry `i` (0-based) is `base_delay * 2^i`, with no jitter, so a schedule
//! is fully reproducible.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{ClientError, Result};

/// Retry schedule for one logical operation
///
/// The policy itself is stateless; attempt counting starts from zero on
/// every call to [`RetryPolicy::invoke`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

    /// Creates a policy
    ///
    /// # Arguments
    /// * `max_attempts` - Total attempts including the first one; must be at least 1
    /// * `base_delay` - Delay before the first retry
    pub fn new(max_attempts: u32, base_delay: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(ClientError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            max_attempts,
            base_delay,
        })
    }

    /// A policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay to wait after failed attempt `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Runs `operation` until it succeeds or attempts run out
    ///
    /// The error of the last attempt is returned unchanged.
    pub async fn invoke<T, E, F, Fut>(&self, operation: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Display,
    {
        self.invoke_when(operation, |_| true).await
    }

    /// Like [`RetryPolicy::invoke`], but gives up early on errors for which
    /// `should_retry` returns false
    pub async fn invoke_when<T, E, F, Fut, P>(
        &self,
        mut operation: F,
        should_retry: P,
    ) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("Succeeded after {} attempt(s)", attempt + 1);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    if attempt + 1 >= self.max_attempts || !should_retry(&e) {
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Request failed, retrying"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay: Self::DEFAULT_BASE_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    /// Records when each attempt started and fails until `succeed_on`
    fn scripted(
        calls: Arc<Mutex<Vec<Instant>>>,
        succeed_on: Option<usize>,
    ) -> impl FnMut() -> std::future::Ready<std::result::Result<usize, String>> {
        move || {
            let mut calls = calls.lock().unwrap();
            calls.push(Instant::now());
            let attempt = calls.len() - 1;
            std::future::ready(match succeed_on {
                Some(k) if attempt == k => Ok(attempt),
                _ => Err(format!("failure #{}", attempt)),
            })
        }
    }

    fn gaps(calls: &[Instant]) -> Vec<Duration> {
        calls.windows(2).map(|w| w[1] - w[0]).collect()
    }

    #[test]
    fn test_rejects_zero_attempts() {
        assert!(matches!(
            RetryPolicy::new(0, Duration::from_millis(10)),
            Err(ClientError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::new(64, Duration::from_secs(1)).unwrap();
        assert_eq!(policy.delay_for(40), Duration::from_secs(u32::MAX as u64));
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_is_invoked_max_attempts_times() {
        for n in 1..=5u32 {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let policy = RetryPolicy::new(n, Duration::from_millis(100)).unwrap();

            let result = policy.invoke(scripted(Arc::clone(&calls), None)).await;

            let calls = calls.lock().unwrap();
            assert_eq!(calls.len(), n as usize);
            assert_eq!(result, Err(format!("failure #{}", n - 1)));

            let expected: Vec<Duration> = (0..n.saturating_sub(1))
                .map(|i| Duration::from_millis(100 * 2u64.pow(i)))
                .collect();
            assert_eq!(gaps(&calls), expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_stops_retrying() {
        let n = 4;
        for k in 0..n {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let policy = RetryPolicy::new(n as u32, Duration::from_millis(50)).unwrap();

            let started = Instant::now();
            let result = policy.invoke(scripted(Arc::clone(&calls), Some(k))).await;

            assert_eq!(result, Ok(k));
            let calls = calls.lock().unwrap();
            assert_eq!(calls.len(), k + 1);

            // No delay after the successful attempt
            assert_eq!(Instant::now(), *calls.last().unwrap());
            let waited: Duration = (0..k as u32).map(|i| policy.delay_for(i)).sum();
            assert_eq!(Instant::now() - started, waited);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_returns_immediately() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100)).unwrap();
        let mut calls = 0;

        let result: std::result::Result<(), ClientError> = policy
            .invoke_when(
                || {
                    calls += 1;
                    std::future::ready(Err(ClientError::business("project not found")))
                },
                ClientError::is_retryable,
            )
            .await;

        assert_eq!(calls, 1);
        assert!(matches!(result, Err(ClientError::Business { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_error_is_retried() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100)).unwrap();
        let mut calls = 0;

        let result = policy
            .invoke_when(
                || {
                    calls += 1;
                    let attempt = calls;
                    async move {
                        if attempt < 3 {
                            Err(ClientError::api_error(503, "warming up"))
                        } else {
                            Ok(attempt)
                        }
                    }
                },
                ClientError::is_retryable,
            )
            .await;

        assert_eq!(result.unwrap(), 3);
    }
}
