use std::sync::Arc;

use crate::config::CrawlConfig;
use crate::failed::FailedLedger;
use crate::frontier::FrontierQueue;
use crate::report::{CrawlEvent, CrawlReporter, WorkerStats};
use crate::retry::{FetchOutcome, retry_with_backoff};
use crate::traits::GraphProvider;
use crate::visited::VisitedSet;

/// State shared by every worker of one engine.
pub(crate) struct SharedState<N> {
    pub(crate) frontier: FrontierQueue<N>,
    pub(crate) sets: VisitedSet<N>,
    pub(crate) failed: FailedLedger<N>,
}

/// One member of the pool: pops ids, fetches them and expands the frontier.
pub(crate) struct CrawlWorker<P, R>
where
    P: GraphProvider,
    R: CrawlReporter,
{
    worker_id: usize,
    provider: P,
    shared: Arc<SharedState<P::Id>>,
    reporter: Arc<R>,
    config: Arc<CrawlConfig>,
}

impl<P, R> CrawlWorker<P, R>
where
    P: GraphProvider,
    R: CrawlReporter,
{
    pub(crate) fn new(
        worker_id: usize,
        provider: P,
        shared: Arc<SharedState<P::Id>>,
        reporter: Arc<R>,
        config: Arc<CrawlConfig>,
    ) -> Self {
        Self {
            worker_id,
            provider,
            shared,
            reporter,
            config,
        }
    }

    /// Run until the frontier stays empty for a whole queue timeout.
    pub(crate) async fn run(self) -> WorkerStats {
        self.reporter.report::<P::Id>(CrawlEvent::WorkerStarted {
            worker_id: self.worker_id,
        });

        let mut stats = WorkerStats::default();
        while let Some(node) = self.shared.frontier.pop(self.config.queue_timeout).await {
            // Duplicate enqueues can slip in before a claim settles.
            if self.shared.sets.is_visited(&node) {
                stats.skipped += 1;
                self.reporter.report(CrawlEvent::DuplicateSkipped {
                    worker_id: self.worker_id,
                    node: &node,
                });
                continue;
            }
            self.process_node(node, &mut stats).await;
        }

        self.reporter.report::<P::Id>(CrawlEvent::WorkerStopped {
            worker_id: self.worker_id,
            stats: &stats,
        });
        stats
    }

    async fn process_node(&self, node: P::Id, stats: &mut WorkerStats) {
        let outcome = retry_with_backoff(
            &self.config.retry,
            |_| self.provider.get(&node),
            |attempt, delay, error| {
                self.reporter.report(CrawlEvent::FetchRetrying {
                    worker_id: self.worker_id,
                    node: &node,
                    attempt,
                    delay,
                    error: &error.to_string(),
                });
            },
        )
        .await;

        let attempts = outcome.attempts();
        stats.attempts += u64::from(attempts);
        stats.retries += u64::from(attempts.saturating_sub(1));

        match outcome {
            FetchOutcome::Success {
                value: neighbors, ..
            } => {
                let neighbor_count = neighbors.len();
                self.shared.sets.mark_visited(node.clone());
                let fresh = self.shared.sets.claim_pending(neighbors);
                let discovered = fresh.len();
                self.shared.frontier.push_all(fresh);
                stats.fetched += 1;

                self.reporter.report(CrawlEvent::NodeFetched {
                    worker_id: self.worker_id,
                    node: &node,
                    neighbors: neighbor_count,
                    discovered,
                });
            }
            FetchOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                // Stays pending, so no other worker enqueues it again this crawl.
                if self.shared.failed.record(node.clone()) {
                    stats.failed += 1;
                }
                self.reporter.report(CrawlEvent::NodeFailed {
                    worker_id: self.worker_id,
                    node: &node,
                    attempts,
                    error: &last_error.to_string(),
                });
            }
        }
    }
}
