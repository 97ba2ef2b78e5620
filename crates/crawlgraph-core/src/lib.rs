pub mod config;
pub mod engine;
pub mod error;
pub mod failed;
pub mod frontier;
pub mod report;
pub mod retry;
pub mod traits;
pub mod visited;

mod worker;

#[cfg(test)]
mod testutil;

pub use config::{CrawlConfig, RetryConfig};
pub use engine::CrawlEngine;
pub use error::CrawlError;
pub use report::{CrawlEvent, CrawlReporter, CrawlSummary, TracingCrawlReporter};
pub use retry::{FetchOutcome, retry_with_backoff};
pub use traits::{GraphProvider, NodeId};
