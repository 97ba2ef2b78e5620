//! Frontier queue: the FIFO of discovered node ids awaiting a fetch.
//!
//! Pushes never block. Pops wait for an item up to a timeout and report an
//! empty frontier as `None`, which is how idle workers learn that the crawl
//! has drained.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;

/// Unbounded multi-producer, multi-consumer FIFO with timed pops.
#[derive(Debug)]
pub struct FrontierQueue<N> {
    items: Mutex<VecDeque<N>>,
    available: Notify,
}

impl<N> Default for FrontierQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> FrontierQueue<N> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Notify::new(),
        }
    }

    /// Acquires the queue lock, recovering from poison if necessary.
    fn lock_items(&self) -> MutexGuard<'_, VecDeque<N>> {
        self.items.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned frontier mutex");
            poisoned.into_inner()
        })
    }

    pub fn push(&self, id: N) {
        self.lock_items().push_back(id);
        self.available.notify_one();
    }

    pub fn push_all(&self, ids: impl IntoIterator<Item = N>) {
        let mut pushed = 0;
        {
            let mut items = self.lock_items();
            for id in ids {
                items.push_back(id);
                pushed += 1;
            }
        }
        // One permit per item so that many idle workers wake up at once.
        for _ in 0..pushed {
            self.available.notify_one();
        }
    }

    /// Take the oldest id without waiting.
    pub fn try_pop(&self) -> Option<N> {
        self.lock_items().pop_front()
    }

    /// Take the oldest id, waiting up to `timeout` for one to arrive.
    ///
    /// Returns `None` if the frontier stayed empty for the whole window.
    pub async fn pop(&self, timeout: Duration) -> Option<N> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // Register interest before checking, so a push landing between
            // the check and the await is not missed.
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(id) = self.try_pop() {
                return Some(id);
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                // A push may have raced the deadline.
                return self.try_pop();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock_items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_items().is_empty()
    }
}
