use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crawlgraph_core::{CrawlConfig, CrawlError, GraphProvider, RetryConfig};

/// Config tuned for tests: short idle window, millisecond backoff.
pub fn fast_config(workers: usize) -> CrawlConfig {
    CrawlConfig::default()
        .with_workers(workers)
        .with_queue_timeout(Duration::from_millis(150))
        .with_retry(RetryConfig::new(5, Duration::from_millis(1)))
}

#[derive(Default)]
struct Script {
    fail_first: HashMap<u64, u32>,
    fail_always: HashSet<u64>,
    calls: HashMap<u64, u32>,
}

/// Deterministic graph of `size` nodes rooted at 0.
///
/// Node `i` links to its tree children `i*degree+1 ..= i*degree+degree`
/// (which makes every node reachable) plus `degree` scattered extra links,
/// so most nodes are discovered many times over.
#[derive(Clone)]
pub struct LayeredGraph {
    size: u64,
    degree: u64,
    latency: Duration,
    script: Arc<Mutex<Script>>,
}

impl LayeredGraph {
    pub fn new(size: u64, degree: u64) -> Self {
        Self {
            size,
            degree,
            latency: Duration::ZERO,
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn fail_first(self, node: u64, times: u32) -> Self {
        self.script.lock().unwrap().fail_first.insert(node, times);
        self
    }

    pub fn fail_always(self, node: u64) -> Self {
        self.script.lock().unwrap().fail_always.insert(node);
        self
    }

    pub fn all_nodes(&self) -> HashSet<u64> {
        (0..self.size).collect()
    }

    pub fn calls(&self, node: u64) -> u32 {
        self.script
            .lock()
            .unwrap()
            .calls
            .get(&node)
            .copied()
            .unwrap_or(0)
    }

    pub fn neighbors(&self, node: u64) -> Vec<u64> {
        let children = (1..=self.degree)
            .map(|k| node * self.degree + k)
            .filter(|&child| child < self.size);
        let scattered = (1..=self.degree).map(|k| (node * 7919 + k * 104_729) % self.size);
        children.chain(scattered).collect()
    }
}

impl GraphProvider for LayeredGraph {
    type Id = u64;

    fn root(&self) -> Result<u64, CrawlError> {
        Ok(0)
    }

    async fn get(&self, id: &u64) -> Result<Vec<u64>, CrawlError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        {
            let mut script = self.script.lock().unwrap();
            *script.calls.entry(*id).or_insert(0) += 1;
            if script.fail_always.contains(id) {
                return Err(CrawlError::Fetch(format!("node {id} is down")));
            }
            if let Some(remaining) = script.fail_first.get_mut(id)
                && *remaining > 0
            {
                *remaining -= 1;
                return Err(CrawlError::Timeout(10));
            }
        }
        Ok(self.neighbors(*id))
    }
}
