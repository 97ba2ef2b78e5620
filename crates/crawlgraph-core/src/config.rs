use std::str::FromStr;
use std::time::Duration;

use crate::error::CrawlError;

pub const ENV_WORKERS: &str = "CRAWLGRAPH_WORKERS";
pub const ENV_QUEUE_TIMEOUT_MS: &str = "CRAWLGRAPH_QUEUE_TIMEOUT_MS";
pub const ENV_MAX_ATTEMPTS: &str = "CRAWLGRAPH_MAX_ATTEMPTS";
pub const ENV_BASE_DELAY_MS: &str = "CRAWLGRAPH_BASE_DELAY_MS";

/// Retry configuration with exponential backoff.
///
/// Delay schedule after the n-th failed attempt: `base_delay * 2^(n-1)`,
/// capped at `max_delay`, plus up to `jitter` of random slack.
/// With the defaults: 1s, 2s, 4s, 8s, then the node is given up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of calls made for one node, first try included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Maximum random jitter added on top of each delay. Zero disables it.
    pub jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: Duration::ZERO,
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Default::default()
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Backoff before the next call, given how many attempts have failed
    /// so far (1-indexed). Jitter is not included.
    pub fn delay_for_attempt(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(31);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        std::cmp::min(delay, self.max_delay)
    }
}

/// Configuration injected into a [`CrawlEngine`](crate::engine::CrawlEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Number of concurrent workers draining the frontier.
    pub workers: usize,
    /// How long an idle worker waits on an empty frontier before exiting.
    ///
    /// This is the only termination signal of a crawl. It must exceed the
    /// latency of a single `get`, otherwise workers retire early and the
    /// crawl loses parallelism (never completeness).
    pub queue_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: 20,
            queue_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }
}

impl CrawlConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_timeout(mut self, timeout: Duration) -> Self {
        self.queue_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Read configuration from environment variables, falling back to defaults.
    ///
    /// - `CRAWLGRAPH_WORKERS` (defaults to 20)
    /// - `CRAWLGRAPH_QUEUE_TIMEOUT_MS` (defaults to 5000)
    /// - `CRAWLGRAPH_MAX_ATTEMPTS` (defaults to 5)
    /// - `CRAWLGRAPH_BASE_DELAY_MS` (defaults to 1000)
    pub fn from_env() -> Result<Self, CrawlError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CrawlError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let workers = parse_var(&lookup, ENV_WORKERS)?.unwrap_or(defaults.workers);
        let queue_timeout = parse_var::<u64, _>(&lookup, ENV_QUEUE_TIMEOUT_MS)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.queue_timeout);
        let max_attempts =
            parse_var(&lookup, ENV_MAX_ATTEMPTS)?.unwrap_or(defaults.retry.max_attempts);
        let base_delay = parse_var::<u64, _>(&lookup, ENV_BASE_DELAY_MS)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry.base_delay);

        let config = Self {
            workers,
            queue_timeout,
            retry: RetryConfig {
                max_attempts,
                base_delay,
                ..defaults.retry
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.workers == 0 {
            return Err(CrawlError::Config("workers must be at least 1".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(CrawlError::Config("max_attempts must be at least 1".into()));
        }
        if self.queue_timeout.is_zero() {
            return Err(CrawlError::Config("queue_timeout must be non-zero".into()));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, CrawlError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            CrawlError::Config(format!("Invalid {key} '{raw}': must be a non-negative integer"))
        }),
    }
}
