use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crawlgraph_core::error::CrawlError;
use crawlgraph_core::traits::GraphProvider;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Builder for a [`SimulatedWeb`].
#[derive(Debug, Clone)]
pub struct SimulatedWebBuilder {
    size: u64,
    degree: u64,
    seed: Option<u64>,
    failure_rate: f64,
    latency: Duration,
    permanent_failures: HashSet<u64>,
}

impl SimulatedWebBuilder {
    /// Seed the link layout and fault injection. Unseeded webs draw from OS entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Probability in `[0, 1]` that a single `get` fails transiently.
    pub fn failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate;
        self
    }

    /// Delay applied to every `get`.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Pages whose `get` never succeeds.
    pub fn fail_permanently(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.permanent_failures.extend(ids);
        self
    }

    pub fn build(self) -> Result<SimulatedWeb, CrawlError> {
        if self.size == 0 {
            return Err(CrawlError::Config("web size must be at least 1".into()));
        }
        if self.size > 1 && self.degree == 0 {
            return Err(CrawlError::Config(
                "degree must be at least 1 when the web has more than one page".into(),
            ));
        }
        if self.degree > self.size {
            return Err(CrawlError::Config(format!(
                "degree {} exceeds web size {}",
                self.degree, self.size
            )));
        }
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(CrawlError::Config(format!(
                "failure rate {} is outside [0, 1]",
                self.failure_rate
            )));
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let links = generate_links(self.size, self.degree, &mut rng);
        let calls = (0..self.size).map(|_| AtomicU32::new(0)).collect();

        tracing::debug!(
            size = self.size,
            degree = self.degree,
            failure_rate = self.failure_rate,
            "Built simulated web"
        );

        Ok(SimulatedWeb {
            inner: Arc::new(WebInner {
                links,
                degree: self.degree,
                failure_rate: self.failure_rate,
                latency: self.latency,
                permanent_failures: self.permanent_failures,
                rng: Mutex::new(rng),
                calls,
            }),
        })
    }
}

/// Lay out `size` pages with `degree` links each, all reachable from page 0.
///
/// Page `i > 0` is first linked from page `(i - 1) / degree`, which caps the
/// tree fan-out at `degree`. Remaining slots point at random pages.
fn generate_links(size: u64, degree: u64, rng: &mut StdRng) -> Vec<Vec<u64>> {
    let mut links: Vec<Vec<u64>> = (0..size)
        .map(|_| Vec::with_capacity(degree as usize))
        .collect();
    for page in 1..size {
        let parent = (page - 1) / degree;
        links[parent as usize].push(page);
    }
    for page_links in &mut links {
        while (page_links.len() as u64) < degree {
            page_links.push(rng.gen_range(0..size));
        }
        // Tree links would otherwise always come first.
        page_links.shuffle(rng);
    }
    links
}

struct WebInner {
    links: Vec<Vec<u64>>,
    degree: u64,
    failure_rate: f64,
    latency: Duration,
    permanent_failures: HashSet<u64>,
    rng: Mutex<StdRng>,
    calls: Vec<AtomicU32>,
}

/// An in-memory web of numbered pages behind a slow, flaky `get`.
///
/// Page `0` is the root. Every page is reachable from it, so a complete
/// crawl of a reliable web finds exactly `size` pages.
#[derive(Clone)]
pub struct SimulatedWeb {
    inner: Arc<WebInner>,
}

impl SimulatedWeb {
    pub fn builder(size: u64, degree: u64) -> SimulatedWebBuilder {
        SimulatedWebBuilder {
            size,
            degree,
            seed: None,
            failure_rate: 0.0,
            latency: Duration::ZERO,
            permanent_failures: HashSet::new(),
        }
    }

    /// A reliable, instant web.
    pub fn new(size: u64, degree: u64) -> Result<Self, CrawlError> {
        Self::builder(size, degree).build()
    }

    pub fn size(&self) -> u64 {
        self.inner.links.len() as u64
    }

    pub fn degree(&self) -> u64 {
        self.inner.degree
    }

    /// Outgoing links of `page`, without going through the flaky `get`.
    pub fn links(&self, page: u64) -> Option<&[u64]> {
        self.inner.links.get(page as usize).map(Vec::as_slice)
    }

    /// Number of `get` calls `page` received, failed ones included.
    pub fn call_count(&self, page: u64) -> u32 {
        self.inner
            .calls
            .get(page as usize)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> u64 {
        self.inner
            .calls
            .iter()
            .map(|c| u64::from(c.load(Ordering::Relaxed)))
            .sum()
    }

    fn roll_failure(&self) -> bool {
        if self.inner.failure_rate <= 0.0 {
            return false;
        }
        let mut rng = self.inner.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_bool(self.inner.failure_rate)
    }
}

impl GraphProvider for SimulatedWeb {
    type Id = u64;

    fn root(&self) -> Result<u64, CrawlError> {
        Ok(0)
    }

    async fn get(&self, id: &u64) -> Result<Vec<u64>, CrawlError> {
        let page = *id;
        let Some(counter) = self.inner.calls.get(page as usize) else {
            return Err(CrawlError::Fetch(format!("page {page} does not exist")));
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if !self.inner.latency.is_zero() {
            tokio::time::sleep(self.inner.latency).await;
        }

        if self.inner.permanent_failures.contains(&page) {
            return Err(CrawlError::Fetch(format!("page {page} is down")));
        }
        if self.roll_failure() {
            tracing::trace!(%page, "Injected transient failure");
            return Err(CrawlError::Fetch(format!("transient failure on page {page}")));
        }

        Ok(self.inner.links[page as usize].clone())
    }
}
