//! Retry Logic for Transient Service Failures
//!
//! Bounded retry with exponential backoff for calls to external services.
//!
//! **Algorithm:**
//! 1. Attempt operation
//! 2. If successful, return result
//! 3. If the error is transient:
//!    a. attempts left: log WARN, backoff, retry
//!    b. attempts exhausted: log ERROR, return the last error
//! 4. Any other error is returned immediately (no retry)

use crate::types::GeocoderError;
use std::future::Future;
use std::time::Duration;

/// Upper bound for a single backoff sleep
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Errors that distinguish retryable failures
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for GeocoderError {
    fn is_transient(&self) -> bool {
        GeocoderError::is_transient(self)
    }
}

/// Run `operation` up to `max_attempts` times (at least once)
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g. "nominatim lookup")
/// * `max_attempts` - Total number of attempts
/// * `initial_backoff` - Sleep after the first failure; doubled after each further failure
/// * `operation` - Async closure performing the call
pub async fn retry_transient<F, Fut, T, E>(
    operation_name: &str,
    max_attempts: u32,
    initial_backoff: Duration,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + std::fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut backoff = initial_backoff;
    let mut attempt = 0;

    loop {
        attempt += 1;

        if attempt > 1 {
            tracing::debug!(operation = operation_name, attempt, "Retrying operation");
        }

        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) if attempt >= max_attempts => {
                tracing::error!(
                    operation = operation_name,
                    attempts = attempt,
                    error = %err,
                    "Operation failed: retries exhausted"
                );
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Transient failure, will retry after backoff"
                );
                if !backoff.is_zero() {
                    tokio::time::sleep(backoff).await;
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_retry_succeeds_first_attempt() {
        let result = retry_transient("test_op", 3, Duration::ZERO, || async {
            Ok::<i32, GeocoderError>(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_errors() {
        let mut attempts = 0;

        let result = retry_transient("test_op", 3, Duration::ZERO, || {
            attempts += 1;
            let current = attempts;
            async move {
                if current < 3 {
                    Err(GeocoderError::Transient("timeout".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let mut attempts = 0;

        let result = retry_transient("test_op", 3, Duration::ZERO, || {
            attempts += 1;
            async { Err::<i32, _>(GeocoderError::Transient("unavailable".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(GeocoderError::Transient(_))));
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_query_error_fails_immediately() {
        let mut attempts = 0;

        let result = retry_transient("test_op", 3, Duration::ZERO, || {
            attempts += 1;
            async { Err::<i32, _>(GeocoderError::Query("bad request".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(GeocoderError::Query(_))));
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let mut attempts = 0;

        let _ = retry_transient("test_op", 0, Duration::ZERO, || {
            attempts += 1;
            async { Err::<i32, _>(GeocoderError::Transient("timeout".to_string())) }
        })
        .await;

        assert_eq!(attempts, 1);
    }
}
