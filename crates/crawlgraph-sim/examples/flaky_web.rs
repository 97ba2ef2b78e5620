use std::time::Duration;

use crawlgraph_core::{CrawlConfig, CrawlEngine, RetryConfig};
use crawlgraph_sim::SimulatedWeb;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("crawlgraph=info".parse()?))
        .with_target(false)
        .init();

    let web = SimulatedWeb::builder(500, 8)
        .failure_rate(0.2)
        .latency(Duration::from_millis(5))
        .fail_permanently([42])
        .build()?;

    let config = CrawlConfig::default()
        .with_workers(16)
        .with_queue_timeout(Duration::from_millis(500))
        .with_retry(RetryConfig::new(5, Duration::from_millis(10)));
    let engine = CrawlEngine::new(config);

    let pages = engine.crawl(&web).await?;
    println!("Crawled {} of {} pages", pages.len(), web.size());
    println!("Failed pages: {:?}", engine.failed_nodes());

    Ok(())
}
