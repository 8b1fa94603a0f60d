//! Bounded retry for operations that may fail transiently.

use anyhow::{Result, anyhow};
use log::{debug, warn};
use std::time::Duration;

/// Maximum number of push attempts to a freshly created fork.
pub const PUSH_MAX_ATTEMPTS: usize = 4;

/// Wait between push attempts. Forks are not writable right after creation
/// and the forge offers no way to ask when they are.
pub const PUSH_RETRY_INTERVAL: Duration = Duration::from_secs(3 * 60);

/// How often and how patiently to retry an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    /// Policy used for pushing to a fork.
    pub fn fork_push() -> Self {
        Self::new(PUSH_MAX_ATTEMPTS, PUSH_RETRY_INTERVAL)
    }

    /// Run `operation` until it succeeds, fails with an error `is_retryable`
    /// rejects, or the attempts run out.
    pub async fn run<F, Fut, T, P>(
        &self,
        operation_name: &str,
        is_retryable: P,
        operation: F,
    ) -> Result<T>
    where
        F: Fn(usize) -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
        P: Fn(&anyhow::Error) -> bool,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match operation(attempt).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !is_retryable(&e) {
                        debug!("{}: non-retryable error: {:#}", operation_name, e);
                        return Err(e);
                    }

                    if attempt < self.max_attempts {
                        warn!(
                            "{}: attempt {}/{} failed ({:#}), retrying in {}s...",
                            operation_name,
                            attempt,
                            self.max_attempts,
                            e,
                            self.interval.as_secs()
                        );
                        tokio::time::sleep(self.interval).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        let last = last_error
            .unwrap_or_else(|| anyhow!("{}: no attempt was made", operation_name));
        Err(last.context(format!(
            "{}: failed after {} attempts",
            operation_name, self.max_attempts
        )))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fork_push()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick(max_attempts: usize) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_run_success() {
        let result = quick(3)
            .run("test", |_| true, |_| async { Ok::<_, anyhow::Error>(42) })
            .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_run_immediate_failure_on_non_retryable() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        let result = quick(4)
            .run(
                "test",
                |_| false,
                |_| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err::<(), _>(anyhow!("permission denied"))
                    }
                },
            )
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_retries_until_success() {
        let result = quick(4)
            .run(
                "test",
                |e| e.to_string().contains("not ready"),
                |attempt| async move {
                    if attempt < 3 {
                        Err(anyhow!("fork not ready"))
                    } else {
                        Ok(attempt)
                    }
                },
            )
            .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_run_exhausts_attempts() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        let result = quick(4)
            .run(
                "push",
                |_| true,
                |_| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err::<(), _>(anyhow!("fork not ready"))
                    }
                },
            )
            .await;

        let err = result.unwrap_err();
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert!(err.to_string().contains("failed after 4 attempts"));
        assert!(format!("{:#}", err).contains("fork not ready"));
    }

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::fork_push();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.interval, Duration::from_secs(180));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
