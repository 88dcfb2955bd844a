//! Retry with exponential backoff for generation calls.

use std::future::Future;
use std::time::Duration;

use crate::error::{LlmError, LlmResult};

/// Retry configuration for generation calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts.
    pub max_attempts: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

/// Execute an async generation call with retry logic.
///
/// Only transient failures (transport errors, 429/5xx) are retried;
/// everything else returns immediately.
///
/// # Errors
/// Returns the last error once attempts are exhausted.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: &str, mut f: F) -> LlmResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = LlmResult<T>>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                tracing::info!(
                    operation,
                    attempt,
                    max_attempts = config.max_attempts,
                    error = %e,
                    "Transient failure, retrying in {delay:?}"
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(
                    config.max_delay,
                    Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier),
                );
            }
            Err(e) => {
                if attempt > 1 {
                    tracing::warn!(operation, attempt, error = %e, "Giving up");
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            backoff_multiplier: 2.0,
        }
    }

    fn transient() -> LlmError {
        LlmError::Api {
            provider: "anthropic",
            status: 503,
            message: "overloaded".to_string(),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let result = with_retry(&fast_config(), "generate", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(transient())
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let attempts = AtomicU32::new(0);
        let result: LlmResult<()> = with_retry(&fast_config(), "generate", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_not_retried() {
        let attempts = AtomicU32::new(0);
        let result: LlmResult<()> = with_retry(&fast_config(), "generate", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(LlmError::ResponseParse {
                    reason: "bad json".to_string(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
