use thiserror::Error;

/// Error types for the crawl engine and graph providers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrawlError {
    /// The provider's `get` failed for a node.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The provider's `get` did not answer in time.
    #[error("Fetch timed out after {0} ms")]
    Timeout(u64),

    /// The provider could not produce a root node. No traversal is possible.
    #[error("Root error: {0}")]
    Root(String),

    /// A worker task panicked or was aborted.
    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
}
