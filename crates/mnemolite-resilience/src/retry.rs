//! Retry with exponential backoff and jitter.
//!
//! `delay(attempt) = min(base * 2^attempt, max_delay)`, then +/-25% jitter,
//! clamped to a non-negative duration.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{error, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RetryError<E> {
    #[error("exhausted {attempts} attempt(s): {source}")]
    Exhausted { attempts: u32, source: E },
}

pub fn calculate_delay(attempt: u32, base_delay: Duration, max_delay: Duration, jitter: bool) -> Duration {
    let exp = base_delay.as_secs_f64() * 2f64.powi(attempt as i32);
    let capped = exp.min(max_delay.as_secs_f64());
    let delay = if jitter {
        let jitter_frac = rand::thread_rng().gen_range(-0.25..=0.25);
        (capped + capped * jitter_frac).max(0.0)
    } else {
        capped
    };
    Duration::from_secs_f64(delay)
}

/// Retries `f` until it succeeds, `should_retry` declines a given error, or
/// `max_attempts` is exhausted. `f` is called fresh on each attempt since
/// futures aren't replayable.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    should_retry: impl Fn(&E) -> bool,
    mut f: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                attempt += 1;
                if attempt >= config.max_attempts || !should_retry(&e) {
                    error!(attempt, max = config.max_attempts, "retry attempts exhausted");
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        source: e,
                    });
                }
                let delay = calculate_delay(attempt, config.base_delay, config.max_delay, config.jitter);
                warn!(attempt, ?delay, "retrying after failure");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delay_is_capped() {
        let d = calculate_delay(10, Duration::from_secs(1), Duration::from_secs(5), false);
        assert_eq!(d, Duration::from_secs(5));
    }

    #[test]
    fn delay_grows_exponentially_without_jitter() {
        let d0 = calculate_delay(0, Duration::from_secs(1), Duration::from_secs(30), false);
        let d1 = calculate_delay(1, Duration::from_secs(1), Duration::from_secs(30), false);
        assert_eq!(d0, Duration::from_secs(1));
        assert_eq!(d1, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let attempts = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter: false,
        };
        let result: Result<u32, RetryError<&str>> = with_retry(&config, |_| true, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("not yet")
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_when_should_retry_declines() {
        let config = RetryConfig::default();
        let result: Result<(), RetryError<&str>> =
            with_retry(&config, |_| false, || async { Err("fatal") }).await;
        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 1, .. })));
    }
}
