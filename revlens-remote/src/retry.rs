//! Bounded retry with pacing for remote calls.
//!
//! Transient failures (rate limits, timeouts, 5xx) are retried up to a
//! configured attempt count with a delay between attempts; permanent
//! failures (bad credentials, missing endpoint) fail immediately since
//! repeating them cannot help.

use revlens_core::{RemoteError, RetryConfig};
use std::future::Future;
use std::time::Duration;

/// Resolved retry behavior for one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    backoff_multiplier: f64,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: config.initial_backoff,
            backoff_multiplier: f64::from(config.backoff_multiplier).max(0.0),
        }
    }

    /// Single attempt, no waiting.
    pub fn no_retries() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retrying after the given failed attempt (1-based).
    fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        self.initial_backoff.mul_f64(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

/// Run `op` until it succeeds, fails permanently, or exhausts attempts.
///
/// Returns the last error when attempts run out. `provider` is only
/// used for log context.
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    provider: &str,
    mut op: F,
) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => {
                tracing::warn!(provider, error = %e, "permanent failure, not retrying");
                return Err(e);
            }
            Err(e) if attempt >= policy.max_attempts => {
                tracing::warn!(provider, attempt, error = %e, "retries exhausted");
                return Err(e);
            }
            Err(e) => {
                let delay = policy.backoff_after(attempt);
                tracing::debug!(
                    provider,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            &RetryConfig::new()
                .with_max_attempts(max_attempts)
                .with_initial_backoff(Duration::from_millis(1)),
        )
    }

    fn transient() -> RemoteError {
        RemoteError::RateLimited {
            provider: "test".to_string(),
        }
    }

    fn permanent() -> RemoteError {
        RemoteError::InvalidApiKey {
            provider: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let calls = AtomicU32::new(0);
        let result = retry(&quick_policy(3), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, RemoteError>("ok".to_string()) }
        })
        .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = retry(&quick_policy(3), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(transient())
                } else {
                    Ok("ok".to_string())
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_attempts_and_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<String, _> = retry(&quick_policy(3), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;
        assert!(matches!(result, Err(RemoteError::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<String, _> = retry(&quick_policy(5), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(permanent()) }
        })
        .await;
        assert!(matches!(result, Err(RemoteError::InvalidApiKey { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_grows_with_multiplier() {
        let policy = RetryPolicy::new(
            &RetryConfig::new()
                .with_initial_backoff(Duration::from_millis(100))
                .with_backoff_multiplier(2.0),
        );
        assert_eq!(policy.backoff_after(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_after(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_after(3), Duration::from_millis(400));
    }

    #[test]
    fn test_flat_backoff_with_unit_multiplier() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_after(1), policy.backoff_after(3));
    }
}
