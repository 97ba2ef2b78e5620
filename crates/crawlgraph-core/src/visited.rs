//! Visited/pending bookkeeping shared by all workers.
//!
//! Both sets live behind one mutex. A node is either unseen, pending
//! (enqueued or being fetched) or visited, and the transition from unseen to
//! pending happens for exactly one caller.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::traits::NodeId;

#[derive(Debug)]
struct SetsInner<N> {
    visited: HashSet<N>,
    pending: HashSet<N>,
}

/// Deduplication state of a crawl.
#[derive(Debug)]
pub struct VisitedSet<N> {
    inner: Mutex<SetsInner<N>>,
}

impl<N: NodeId> Default for VisitedSet<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NodeId> VisitedSet<N> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SetsInner {
                visited: HashSet::new(),
                pending: HashSet::new(),
            }),
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, SetsInner<N>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned visited-set mutex");
            poisoned.into_inner()
        })
    }

    /// Record a successful fetch of `id`. Returns false if it was already visited.
    pub fn mark_visited(&self, id: N) -> bool {
        let mut inner = self.lock_inner();
        inner.pending.remove(&id);
        inner.visited.insert(id)
    }

    /// Claim the ids nobody has visited or enqueued yet.
    ///
    /// The returned ids are now pending and belong to the caller, who must
    /// push them onto the frontier. Duplicates within `ids` are claimed once.
    pub fn claim_pending(&self, ids: impl IntoIterator<Item = N>) -> Vec<N> {
        let mut inner = self.lock_inner();
        let SetsInner { visited, pending } = &mut *inner;
        ids.into_iter()
            .filter(|id| !visited.contains(id) && pending.insert(id.clone()))
            .collect()
    }

    pub fn is_visited(&self, id: &N) -> bool {
        self.lock_inner().visited.contains(id)
    }

    pub fn visited_len(&self) -> usize {
        self.lock_inner().visited.len()
    }

    pub fn visited_snapshot(&self) -> HashSet<N> {
        self.lock_inner().visited.clone()
    }
}
