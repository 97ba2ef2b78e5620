use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::traits::NodeId;

#[derive(Debug)]
struct LedgerInner<N> {
    order: Vec<N>,
    seen: HashSet<N>,
}

/// Append-only list of nodes whose fetch exhausted every retry.
///
/// Guarded separately from the visited/pending sets. Recording the same node
/// twice is a no-op, so a node shows up here at most once.
#[derive(Debug)]
pub struct FailedLedger<N> {
    inner: Mutex<LedgerInner<N>>,
}

impl<N: NodeId> Default for FailedLedger<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NodeId> FailedLedger<N> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LedgerInner {
                order: Vec::new(),
                seen: HashSet::new(),
            }),
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, LedgerInner<N>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned failed-ledger mutex");
            poisoned.into_inner()
        })
    }

    /// Returns false if the node was already recorded.
    pub fn record(&self, id: N) -> bool {
        let mut inner = self.lock_inner();
        if !inner.seen.insert(id.clone()) {
            return false;
        }
        inner.order.push(id);
        true
    }

    pub fn contains(&self, id: &N) -> bool {
        self.lock_inner().seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock_inner().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Failed ids in the order they were given up.
    pub fn snapshot(&self) -> Vec<N> {
        self.lock_inner().order.clone()
    }
}
