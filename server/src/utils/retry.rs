//! Async retry utilities with exponential backoff

use std::time::Duration;

/// Retry an async operation with exponential backoff.
///
/// Returns `Ok((value, attempts))` on success, or `Err((error, attempts))`
/// once `max_attempts` is exhausted or `is_retryable` rejects the error.
/// `max_attempts` of 0 behaves like 1.
pub async fn retry_with_backoff_async_if<T, F, Fut, E, R>(
    max_attempts: u32,
    base_delay_ms: u64,
    mut operation: F,
    is_retryable: R,
) -> Result<(T, u32), (E, u32)>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match operation().await {
            Ok(value) => return Ok((value, attempts)),
            Err(e) => {
                if attempts >= max_attempts || !is_retryable(&e) {
                    return Err((e, attempts));
                }
                let delay = Duration::from_millis(
                    base_delay_ms.saturating_mul(2_u64.saturating_pow(attempts - 1)),
                );
                tracing::debug!(
                    error = %e,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Retrying after transient error"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[tokio::test]
    async fn test_success_on_first_try() {
        let result = retry_with_backoff_async_if(3, 10, || async { Ok::<_, &str>(7) }, |_| true).await;
        assert_eq!(result, Ok((7, 1)));
    }

    #[tokio::test]
    async fn test_success_after_retry() {
        let attempts = RefCell::new(0);
        let result = retry_with_backoff_async_if(
            3,
            1,
            || {
                *attempts.borrow_mut() += 1;
                let current = *attempts.borrow();
                async move {
                    if current < 2 {
                        Err("transient error")
                    } else {
                        Ok("done")
                    }
                }
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Ok(("done", 2)));
    }

    #[tokio::test]
    async fn test_failure_after_max_retries() {
        let result = retry_with_backoff_async_if(
            3,
            1,
            || async { Err::<(), _>("persistent error") },
            |_| true,
        )
        .await;
        let (error, attempts) = result.unwrap_err();
        assert_eq!(error, "persistent error");
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_early() {
        let result = retry_with_backoff_async_if(
            5,
            1,
            || async { Err::<(), _>("bad request") },
            |e| *e != "bad request",
        )
        .await;
        assert_eq!(result.unwrap_err(), ("bad request", 1));
    }

    #[tokio::test]
    async fn test_zero_attempts_runs_once() {
        let result = retry_with_backoff_async_if(0, 1, || async { Err::<(), _>("nope") }, |_| true).await;
        assert_eq!(result.unwrap_err().1, 1);
    }
}
