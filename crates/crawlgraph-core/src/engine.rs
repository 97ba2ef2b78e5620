use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::task::JoinSet;

use crate::config::CrawlConfig;
use crate::error::CrawlError;
use crate::failed::FailedLedger;
use crate::frontier::FrontierQueue;
use crate::report::{CrawlEvent, CrawlReporter, CrawlSummary, TracingCrawlReporter, WorkerStats};
use crate::traits::{GraphProvider, NodeId};
use crate::visited::VisitedSet;
use crate::worker::{CrawlWorker, SharedState};

/// Concurrent breadth-first crawler over a [`GraphProvider`].
///
/// Visited, pending and failed state outlives a single crawl. A second
/// `crawl` on the same engine does not fetch a root it already visited, and
/// `failed_nodes` can be queried after the crawl returns.
pub struct CrawlEngine<N, R = TracingCrawlReporter>
where
    N: NodeId,
    R: CrawlReporter,
{
    shared: Arc<SharedState<N>>,
    reporter: Arc<R>,
    config: Arc<CrawlConfig>,
    last_summary: Mutex<Option<CrawlSummary>>,
    // Crawls on one engine never overlap.
    run_lock: tokio::sync::Mutex<()>,
}

impl<N: NodeId> CrawlEngine<N> {
    pub fn new(config: CrawlConfig) -> Self {
        Self::with_reporter(config, TracingCrawlReporter)
    }
}

impl<N: NodeId> Default for CrawlEngine<N> {
    fn default() -> Self {
        Self::new(CrawlConfig::default())
    }
}

impl<N, R> CrawlEngine<N, R>
where
    N: NodeId,
    R: CrawlReporter,
{
    pub fn with_reporter(config: CrawlConfig, reporter: R) -> Self {
        Self {
            shared: Arc::new(SharedState {
                frontier: FrontierQueue::new(),
                sets: VisitedSet::new(),
                failed: FailedLedger::new(),
            }),
            reporter: Arc::new(reporter),
            config: Arc::new(config),
            last_summary: Mutex::new(None),
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Crawl everything reachable from `provider.root()`.
    ///
    /// Returns once every worker has found the frontier empty for a full
    /// queue timeout. Nodes whose fetch kept failing are not in the returned
    /// set; see [`failed_nodes`](Self::failed_nodes). Only an invalid
    /// config, a failing root or a panicking worker makes this return an
    /// error.
    pub async fn crawl<P>(&self, provider: &P) -> Result<HashSet<N>, CrawlError>
    where
        P: GraphProvider<Id = N>,
    {
        let _running = self.run_lock.lock().await;
        self.config.validate()?;
        let start = Instant::now();

        let root = provider.root().map_err(|e| match e {
            CrawlError::Root(_) => e,
            other => CrawlError::Root(other.to_string()),
        })?;

        let reseeded = !self.shared.sets.is_visited(&root);
        if reseeded {
            // A root left pending by an earlier failed crawl is seeded again.
            self.shared.sets.claim_pending([root.clone()]);
            self.shared.frontier.push(root.clone());
        }
        self.reporter.report(CrawlEvent::CrawlStarted {
            root: &root,
            workers: self.config.workers,
            reseeded,
        });

        let stats = self.run_pool(provider).await?;

        let summary = CrawlSummary::new(
            self.shared.sets.visited_len(),
            self.shared.failed.len(),
            stats,
            self.config.workers,
            start.elapsed(),
        );
        self.reporter
            .report::<N>(CrawlEvent::CrawlFinished { summary: &summary });
        *self.lock_summary() = Some(summary);

        Ok(self.shared.sets.visited_snapshot())
    }

    /// Spawn the workers and wait for all of them to retire.
    async fn run_pool<P>(&self, provider: &P) -> Result<WorkerStats, CrawlError>
    where
        P: GraphProvider<Id = N>,
    {
        let worker_count = self.config.workers;
        tracing::debug!(workers = worker_count, "Starting worker pool");

        let mut pool = JoinSet::new();
        for worker_id in 0..worker_count {
            let worker = CrawlWorker::new(
                worker_id,
                provider.clone(),
                Arc::clone(&self.shared),
                Arc::clone(&self.reporter),
                Arc::clone(&self.config),
            );
            pool.spawn(worker.run());
        }

        let mut total = WorkerStats::default();
        let mut first_panic = None;
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(stats) => total = total.merge(stats),
                Err(e) => {
                    tracing::error!(error = %e, "Crawl worker task failed");
                    first_panic.get_or_insert_with(|| e.to_string());
                }
            }
        }

        match first_panic {
            Some(message) => Err(CrawlError::WorkerPanicked(message)),
            None => Ok(total),
        }
    }

    /// Ids whose fetch exhausted every retry, in the order they were given up.
    pub fn failed_nodes(&self) -> Vec<N> {
        self.shared.failed.snapshot()
    }

    /// Every id fetched successfully so far, across all crawls.
    pub fn visited_nodes(&self) -> HashSet<N> {
        self.shared.sets.visited_snapshot()
    }

    /// Summary of the most recent completed crawl.
    pub fn last_summary(&self) -> Option<CrawlSummary> {
        self.lock_summary().clone()
    }

    fn lock_summary(&self) -> std::sync::MutexGuard<'_, Option<CrawlSummary>> {
        self.last_summary.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned summary mutex");
            poisoned.into_inner()
        })
    }
}
