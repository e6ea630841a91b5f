//! Retry logic for transient provider failures
//!
//! Provides automatic retry with exponential backoff for HTTP requests.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::{RankingError, Result};

/// Base delay before the first retry.
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 200;

/// Upper bound for a single backoff.
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 5_000;

/// Execute a provider request with automatic retry on transient failures
///
/// # Example
/// ```ignore
/// use rugby_rankings_core::clients::retry::execute_with_retry;
///
/// let record = execute_with_retry(|| client.get_json(&url), 3).await?;
/// ```
pub async fn execute_with_retry<F, Fut, T>(f: F, max_attempts: u32) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    execute_with_retry_custom(f, max_attempts, DEFAULT_BASE_BACKOFF_MS, DEFAULT_MAX_BACKOFF_MS)
        .await
}

/// Execute with retry and custom backoff configuration
pub async fn execute_with_retry_custom<F, Fut, T>(
    mut f: F,
    max_attempts: u32,
    base_backoff_ms: u64,
    max_backoff_ms: u64,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && is_retriable_error(&e) => {
                let backoff_ms = backoff_for(attempt, base_backoff_ms, max_backoff_ms);
                warn!(
                    "Provider request failed (attempt {}/{}): {}. Retrying in {}ms",
                    attempt, max_attempts, e, backoff_ms
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

fn backoff_for(attempt: u32, base_backoff_ms: u64, max_backoff_ms: u64) -> u64 {
    let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
    base_backoff_ms.saturating_mul(factor).min(max_backoff_ms)
}

/// Check if a provider error is worth retrying
pub fn is_retriable_error(e: &RankingError) -> bool {
    match e {
        RankingError::Http(err) => err.is_timeout() || err.is_connect(),
        RankingError::Status { status, .. } => is_retriable_status(*status),
        _ => false,
    }
}

fn is_retriable_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn status_error(status: u16) -> RankingError {
        RankingError::Status {
            url: "https://example.test/rankings/mru".to_string(),
            status,
        }
    }

    #[test]
    fn test_is_retriable_error() {
        // Rate limiting and server errors (retriable)
        assert!(is_retriable_error(&status_error(429)));
        assert!(is_retriable_error(&status_error(500)));
        assert!(is_retriable_error(&status_error(503)));

        // Client errors (not retriable)
        assert!(!is_retriable_error(&status_error(404)));
        assert!(!is_retriable_error(&status_error(400)));
        assert!(!is_retriable_error(&RankingError::UnknownSource("x".to_string())));
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff_for(1, 100, 1_000), 100);
        assert_eq!(backoff_for(3, 100, 1_000), 400);
        assert_eq!(backoff_for(10, 100, 1_000), 1_000);
        assert_eq!(backoff_for(80, 100, 1_000), 1_000);
    }

    #[tokio::test]
    async fn test_retry_succeeds_eventually() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = attempt_count.clone();

        let result: Result<i32> = execute_with_retry_custom(
            || {
                let count = attempt_count_clone.clone();
                async move {
                    let current = count.fetch_add(1, Ordering::SeqCst) + 1;
                    if current < 3 {
                        Err(status_error(503))
                    } else {
                        Ok(42)
                    }
                }
            },
            3,
            1,
            5,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_fails_after_max_attempts() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = attempt_count.clone();

        let result: Result<i32> = execute_with_retry_custom(
            || {
                let count = attempt_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err(status_error(502))
                }
            },
            3,
            1,
            5,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retry_on_client_error() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = attempt_count.clone();

        let result: Result<i32> = execute_with_retry(
            || {
                let count = attempt_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err(status_error(404))
                }
            },
            3,
        )
        .await;

        assert!(matches!(result, Err(RankingError::Status { status: 404, .. })));
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }
}
