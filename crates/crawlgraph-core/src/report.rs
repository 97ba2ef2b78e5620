use std::fmt::Debug;
use std::time::Duration;

use serde::Serialize;

/// Events emitted by the engine and its workers for monitoring/logging.
#[derive(Debug, Clone)]
pub enum CrawlEvent<'a, N> {
    CrawlStarted {
        root: &'a N,
        workers: usize,
        reseeded: bool,
    },
    WorkerStarted {
        worker_id: usize,
    },
    NodeFetched {
        worker_id: usize,
        node: &'a N,
        neighbors: usize,
        discovered: usize,
    },
    FetchRetrying {
        worker_id: usize,
        node: &'a N,
        attempt: u32,
        delay: Duration,
        error: &'a str,
    },
    NodeFailed {
        worker_id: usize,
        node: &'a N,
        attempts: u32,
        error: &'a str,
    },
    DuplicateSkipped {
        worker_id: usize,
        node: &'a N,
    },
    WorkerStopped {
        worker_id: usize,
        stats: &'a WorkerStats,
    },
    CrawlFinished {
        summary: &'a CrawlSummary,
    },
}

/// Trait for receiving crawl events (decoupled logging).
pub trait CrawlReporter: Send + Sync + 'static {
    fn report<N: Debug>(&self, event: CrawlEvent<'_, N>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCrawlReporter;

impl CrawlReporter for TracingCrawlReporter {
    fn report<N: Debug>(&self, event: CrawlEvent<'_, N>) {
        match event {
            CrawlEvent::CrawlStarted {
                root,
                workers,
                reseeded,
            } => {
                tracing::info!(?root, %workers, %reseeded, "Crawl started");
            }
            CrawlEvent::WorkerStarted { worker_id } => {
                tracing::debug!(%worker_id, "Worker started");
            }
            CrawlEvent::NodeFetched {
                worker_id,
                node,
                neighbors,
                discovered,
            } => {
                tracing::debug!(%worker_id, ?node, %neighbors, %discovered, "Node fetched");
            }
            CrawlEvent::FetchRetrying {
                worker_id,
                node,
                attempt,
                delay,
                error,
            } => {
                tracing::debug!(
                    %worker_id,
                    ?node,
                    %attempt,
                    delay_ms = %delay.as_millis(),
                    %error,
                    "Fetch failed, backing off"
                );
            }
            CrawlEvent::NodeFailed {
                worker_id,
                node,
                attempts,
                error,
            } => {
                tracing::warn!(%worker_id, ?node, %attempts, %error, "Node failed after retries");
            }
            CrawlEvent::DuplicateSkipped { worker_id, node } => {
                tracing::trace!(%worker_id, ?node, "Already visited, skipping");
            }
            CrawlEvent::WorkerStopped { worker_id, stats } => {
                tracing::debug!(
                    %worker_id,
                    fetched = stats.fetched,
                    failed = stats.failed,
                    retries = stats.retries,
                    "Worker stopped"
                );
            }
            CrawlEvent::CrawlFinished { summary } => {
                tracing::info!(
                    visited = summary.visited,
                    failed = summary.failed,
                    retries = summary.retries,
                    elapsed_ms = summary.elapsed_ms,
                    "Crawl finished"
                );
            }
        }
    }
}

/// Per-worker counters, summed into a [`CrawlSummary`] once the pool drains.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    /// Nodes fetched successfully and expanded.
    pub fetched: u64,
    /// Nodes given up after the retry budget.
    pub failed: u64,
    /// Calls to the provider's `get`, retries included.
    pub attempts: u64,
    /// Failed calls that were followed by another attempt.
    pub retries: u64,
    /// Popped ids that turned out to be visited already.
    pub skipped: u64,
}

impl WorkerStats {
    pub fn merge(self, other: WorkerStats) -> WorkerStats {
        WorkerStats {
            fetched: self.fetched + other.fetched,
            failed: self.failed + other.failed,
            attempts: self.attempts + other.attempts,
            retries: self.retries + other.retries,
            skipped: self.skipped + other.skipped,
        }
    }
}

/// Outcome of one `crawl()` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    /// Size of the visited set after the crawl (earlier crawls included).
    pub visited: usize,
    /// Size of the failed list after the crawl (earlier crawls included).
    pub failed: usize,
    /// Nodes fetched during this crawl.
    pub fetched: u64,
    pub attempts: u64,
    pub retries: u64,
    pub workers: usize,
    pub elapsed_ms: u64,
}

impl CrawlSummary {
    pub fn new(
        visited: usize,
        failed: usize,
        stats: WorkerStats,
        workers: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            visited,
            failed,
            fetched: stats.fetched,
            attempts: stats.attempts,
            retries: stats.retries,
            workers,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}
