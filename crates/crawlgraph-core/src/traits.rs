use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;

use crate::error::CrawlError;

/// Identity of a node in a crawled graph.
///
/// Nothing is assumed about an id beyond equality and hashing. Blanket
/// implemented for every type that qualifies.
pub trait NodeId: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> NodeId for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Opaque access to a graph: a root and a fetch of outgoing neighbors.
///
/// `get` may be slow and may fail; the engine treats every error it returns
/// as transient and retries it with backoff. Implementations are cloned once
/// per worker, so cloning should be cheap (an `Arc` or a small handle).
pub trait GraphProvider: Send + Sync + Clone + 'static {
    type Id: NodeId;

    /// The node the traversal starts from. Called once per crawl.
    fn root(&self) -> Result<Self::Id, CrawlError>;

    /// Fetch the ids `id` links to.
    fn get(&self, id: &Self::Id) -> impl Future<Output = Result<Vec<Self::Id>, CrawlError>> + Send;
}
