use std::future::Future;
use std::time::Duration;

use rand::Rng;

/// How long to wait between attempts against Azure Resource Manager
#[derive(Clone, Debug, Default)]
pub enum Backoff {
    /// Same delay every time
    #[default]
    Fixed,
    /// delay = min(base * 2^attempt + jitter, max)
    Exponential { base_ms: u64, max_ms: u64 },
}

/// Retry policy for transient ARM failures (throttling, gateway errors)
#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::exponential(3, 800, 10_000)
    }
}

impl RetryConfig {
    pub fn exponential(max_attempts: u32, base_ms: u64, max_ms: u64) -> Self {
        Self {
            max_attempts,
            delay: Duration::from_millis(base_ms),
            backoff: Backoff::Exponential { base_ms, max_ms },
        }
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
            backoff: Backoff::Fixed,
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match &self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { base_ms, max_ms } => {
                let base = base_ms.saturating_mul(2_u64.saturating_pow(attempt));
                let jitter = random_jitter(base / 2);
                Duration::from_millis(base.saturating_add(jitter).min(*max_ms))
            }
        }
    }
}

fn random_jitter(max_jitter: u64) -> u64 {
    if max_jitter == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..=max_jitter)
}

/// Errors that are worth another attempt
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;

    /// Delay the server asked for, overriding the configured backoff
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Run `operation` until it succeeds, fails permanently, or attempts run out.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                let delay = e
                    .retry_after()
                    .unwrap_or_else(|| config.delay_for_attempt(attempt));
                tracing::warn!(
                    attempt = attempt + 1,
                    max = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient ARM error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Flaky {
        retryable: bool,
    }

    struct Throttled(Duration);

    impl std::fmt::Display for Throttled {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "throttled for {:?}", self.0)
        }
    }

    impl IsRetryable for Throttled {
        fn is_retryable(&self) -> bool {
            true
        }

        fn retry_after(&self) -> Option<Duration> {
            Some(self.0)
        }
    }

    impl std::fmt::Display for Flaky {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "flaky (retryable={})", self.retryable)
        }
    }

    impl IsRetryable for Flaky {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    fn fast(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            delay: Duration::from_millis(1),
            backoff: Backoff::Fixed,
        }
    }

    #[tokio::test]
    async fn retries_throttled_calls_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let count = calls.clone();

        let result: Result<&str, Flaky> = with_retry(&fast(3), || {
            let n = count.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Flaky { retryable: true })
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_error_is_returned_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let count = calls.clone();

        let result: Result<(), Flaky> = with_retry(&fast(5), || {
            count.fetch_add(1, Ordering::SeqCst);
            async { Err(Flaky { retryable: false }) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let count = calls.clone();

        let result: Result<(), Flaky> = with_retry(&fast(2), || {
            count.fetch_add(1, Ordering::SeqCst);
            async { Err(Flaky { retryable: true }) }
        })
        .await;

        assert!(result.unwrap_err().retryable);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn none_means_one_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let count = calls.clone();

        let _: Result<(), Flaky> = with_retry(&RetryConfig::none(), || {
            count.fetch_add(1, Ordering::SeqCst);
            async { Err(Flaky { retryable: true }) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn server_delay_overrides_backoff() {
        let config = RetryConfig {
            max_attempts: 2,
            delay: Duration::from_secs(300),
            backoff: Backoff::Fixed,
        };
        let calls = Arc::new(AtomicU32::new(0));
        let count = calls.clone();
        let started = tokio::time::Instant::now();

        let result: Result<(), Throttled> = with_retry(&config, || {
            let n = count.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(Throttled(Duration::from_secs(2)))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() < Duration::from_secs(300));
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[test]
    fn exponential_delay_is_capped() {
        let config = RetryConfig::exponential(10, 100, 1_000);
        assert!(config.delay_for_attempt(0) >= Duration::from_millis(100));
        assert!(config.delay_for_attempt(0) <= Duration::from_millis(150));
        assert_eq!(config.delay_for_attempt(8), Duration::from_millis(1_000));
    }
}
