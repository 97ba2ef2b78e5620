//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::CrawlError;
use crate::report::{CrawlEvent, CrawlReporter};
use crate::traits::{GraphProvider, NodeId};

// ---------------------------------------------------------------------------
// MockGraph
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct MockGraphInner<N> {
    edges: HashMap<N, Vec<N>>,
    /// Remaining scripted failures per node before `get` succeeds.
    fail_budget: HashMap<N, (u32, CrawlError)>,
    fail_always: HashSet<N>,
    calls: HashMap<N, u32>,
}

/// In-memory graph with scripted failures and per-node call counts.
///
/// Nodes absent from the edge list have no neighbors.
#[derive(Clone)]
pub struct MockGraph<N: NodeId> {
    root: N,
    root_error: Option<CrawlError>,
    latency: Duration,
    panic_on: Option<N>,
    inner: Arc<Mutex<MockGraphInner<N>>>,
}

impl<N: NodeId> MockGraph<N> {
    pub fn from_edges(root: N, edges: impl IntoIterator<Item = (N, Vec<N>)>) -> Self {
        Self {
            root,
            root_error: None,
            latency: Duration::ZERO,
            panic_on: None,
            inner: Arc::new(Mutex::new(MockGraphInner {
                edges: edges.into_iter().collect(),
                fail_budget: HashMap::new(),
                fail_always: HashSet::new(),
                calls: HashMap::new(),
            })),
        }
    }

    /// `root()` returns this error instead of the root.
    pub fn with_root_error(mut self, error: CrawlError) -> Self {
        self.root_error = Some(error);
        self
    }

    /// Every `get` sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// `get(node)` fails `times` times, then succeeds.
    pub fn fail_times(self, node: N, times: u32) -> Self {
        let error = CrawlError::Fetch(format!("{node:?} flaked"));
        self.fail_times_with(node, times, error)
    }

    /// `get(node)` returns `error` `times` times, then succeeds.
    pub fn fail_times_with(self, node: N, times: u32, error: CrawlError) -> Self {
        self.inner
            .lock()
            .unwrap()
            .fail_budget
            .insert(node, (times, error));
        self
    }

    /// `get(node)` panics. Checked before any lock is taken.
    pub fn panic_on(mut self, node: N) -> Self {
        self.panic_on = Some(node);
        self
    }

    /// `get(node)` never succeeds.
    pub fn fail_always(self, node: N) -> Self {
        self.inner.lock().unwrap().fail_always.insert(node);
        self
    }

    pub fn call_count(&self, node: &N) -> u32 {
        self.inner
            .lock()
            .unwrap()
            .calls
            .get(node)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.inner.lock().unwrap().calls.values().sum()
    }

    /// The largest number of `get` calls any single node received.
    pub fn max_calls_per_node(&self) -> u32 {
        self.inner
            .lock()
            .unwrap()
            .calls
            .values()
            .copied()
            .max()
            .unwrap_or(0)
    }

    fn answer(&self, node: &N) -> Result<Vec<N>, CrawlError> {
        let mut inner = self.inner.lock().unwrap();
        *inner.calls.entry(node.clone()).or_insert(0) += 1;

        if inner.fail_always.contains(node) {
            return Err(CrawlError::Fetch(format!("{node:?} is unreachable")));
        }
        if let Some((remaining, error)) = inner.fail_budget.get_mut(node)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(error.clone());
        }
        Ok(inner.edges.get(node).cloned().unwrap_or_default())
    }
}

impl<N: NodeId> GraphProvider for MockGraph<N> {
    type Id = N;

    fn root(&self) -> Result<N, CrawlError> {
        match &self.root_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.root.clone()),
        }
    }

    async fn get(&self, id: &N) -> Result<Vec<N>, CrawlError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.panic_on.as_ref() == Some(id) {
            panic!("scripted panic fetching {id:?}");
        }
        self.answer(id)
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// One recorded event: its kind and the node it concerns, if any.
pub type RecordedEvent = (&'static str, Option<String>);

/// Reporter that keeps every event for later assertions.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    pub events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingReporter {
    pub fn count(&self, kind: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    /// Number of backoff sleeps recorded for the node whose `Debug` form is `node`.
    pub fn retries_for(&self, node: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, n)| *k == "fetch_retrying" && n.as_deref() == Some(node))
            .count()
    }
}

impl CrawlReporter for RecordingReporter {
    fn report<N: Debug>(&self, event: CrawlEvent<'_, N>) {
        let recorded = match event {
            CrawlEvent::CrawlStarted { root, .. } => ("crawl_started", Some(format!("{root:?}"))),
            CrawlEvent::WorkerStarted { .. } => ("worker_started", None),
            CrawlEvent::NodeFetched { node, .. } => ("node_fetched", Some(format!("{node:?}"))),
            CrawlEvent::FetchRetrying { node, .. } => {
                ("fetch_retrying", Some(format!("{node:?}")))
            }
            CrawlEvent::NodeFailed { node, .. } => ("node_failed", Some(format!("{node:?}"))),
            CrawlEvent::DuplicateSkipped { node, .. } => {
                ("duplicate_skipped", Some(format!("{node:?}")))
            }
            CrawlEvent::WorkerStopped { .. } => ("worker_stopped", None),
            CrawlEvent::CrawlFinished { .. } => ("crawl_finished", None),
        };
        self.events.lock().unwrap().push(recorded);
    }
}
