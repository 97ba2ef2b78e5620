//! Bounded retry with exponential backoff around a single fallible fetch.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use crawlgraph_core::config::RetryConfig;
//! use crawlgraph_core::error::CrawlError;
//! use crawlgraph_core::retry::{FetchOutcome, retry_with_backoff};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = RetryConfig::new(3, Duration::from_millis(1));
//! let outcome = retry_with_backoff(
//!     &config,
//!     |attempt| async move {
//!         if attempt < 2 { Err(CrawlError::Fetch("flaky".into())) } else { Ok(attempt) }
//!     },
//!     |_, _, _| {},
//! )
//! .await;
//! assert_eq!(outcome, FetchOutcome::Success { value: 2, attempts: 2 });
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::CrawlError;

/// Result of a retried fetch: a value, or the budget ran out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    Success { value: T, attempts: u32 },
    Exhausted { attempts: u32, last_error: CrawlError },
}

impl<T> FetchOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            FetchOutcome::Success { attempts, .. } | FetchOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Run `operation` until it succeeds or `config.max_attempts` calls have failed.
///
/// `operation` receives the 1-indexed attempt number. Between failures the
/// caller sleeps for [`RetryConfig::delay_for_attempt`] plus jitter;
/// `on_retry(attempt, delay, error)` is invoked right before each sleep.
/// Every error counts as transient, whatever its variant.
pub async fn retry_with_backoff<T, F, Fut, R>(
    config: &RetryConfig,
    mut operation: F,
    mut on_retry: R,
) -> FetchOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, CrawlError>>,
    R: FnMut(u32, Duration, &CrawlError),
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => {
                return FetchOutcome::Success {
                    value,
                    attempts: attempt,
                };
            }
            Err(error) if attempt >= max_attempts => {
                return FetchOutcome::Exhausted {
                    attempts: attempt,
                    last_error: error,
                };
            }
            Err(error) => {
                let delay = config.delay_for_attempt(attempt) + jitter(config.jitter);
                on_retry(attempt, delay, &error);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Jitter from a xorshift seeded by the clock. Not crypto, just spreads retries.
// ---------------------------------------------------------------------------

fn jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
        | 1;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    Duration::from_millis(x % max_ms)
}
