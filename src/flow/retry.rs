use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

/// Bounds the number of execute attempts for a stage and the wait between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt
    pub retries: u32,
    /// Wait between consecutive attempts
    pub wait: Duration,
}

impl RetryPolicy {
    /// Single attempt, no waiting
    pub const fn none() -> Self {
        Self {
            retries: 0,
            wait: Duration::ZERO,
        }
    }

    pub const fn new(retries: u32, wait: Duration) -> Self {
        Self { retries, wait }
    }

    /// Total number of execute attempts: retries + 1
    pub const fn max_attempts(&self) -> u32 {
        self.retries + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Drive a fallible operation under a retry policy.
///
/// Invokes `attempt` up to `policy.max_attempts()` times, sleeping
/// `policy.wait` between attempts. Every failure is treated identically
/// regardless of cause; the last error is returned once attempts run out.
pub async fn run_with_retry<T, F, Fut>(name: &str, policy: &RetryPolicy, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts();
    let mut last_error = None;

    for n in 1..=max_attempts {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("{}: attempt {}/{} failed: {:#}", name, n, max_attempts, e);
                last_error = Some(e);
            }
        }

        if n < max_attempts && !policy.wait.is_zero() {
            tokio::time::sleep(policy.wait).await;
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no attempts were made")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_max_attempts() {
        assert_eq!(RetryPolicy::none().max_attempts(), 1);
        assert_eq!(RetryPolicy::new(2, Duration::ZERO).max_attempts(), 3);
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let result = run_with_retry("t", &policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, anyhow::Error>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, Duration::ZERO);

        let result = run_with_retry("t", &policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    anyhow::bail!("transient")
                }
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_all_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, Duration::ZERO);

        let result: Result<()> = run_with_retry("t", &policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { anyhow::bail!("always down") }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), policy.max_attempts());
    }
}
