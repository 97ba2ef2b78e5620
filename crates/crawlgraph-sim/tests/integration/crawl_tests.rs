use std::time::Duration;

use crawlgraph_core::{CrawlConfig, CrawlEngine, RetryConfig};
use crawlgraph_sim::SimulatedWeb;

fn config(workers: usize, max_attempts: u32) -> CrawlConfig {
    CrawlConfig::default()
        .with_workers(workers)
        .with_queue_timeout(Duration::from_millis(200))
        .with_retry(RetryConfig::new(max_attempts, Duration::from_millis(1)))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn crawl_finds_every_page_of_reliable_web() {
    let web = SimulatedWeb::builder(1000, 10).seed(2024).build().unwrap();
    let engine = CrawlEngine::new(config(20, 5));

    let pages = engine.crawl(&web).await.unwrap();

    assert_eq!(pages.len(), 1000);
    assert!(engine.failed_nodes().is_empty());
    assert_eq!(web.total_calls(), 1000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn flaky_web_is_fully_crawled_with_retries() {
    let web = SimulatedWeb::builder(300, 5)
        .seed(7)
        .failure_rate(0.1)
        .build()
        .unwrap();
    let engine = CrawlEngine::new(config(10, 10));

    let pages = engine.crawl(&web).await.unwrap();

    assert_eq!(pages.len(), 300);
    assert!(engine.failed_nodes().is_empty());
    assert!(web.total_calls() >= 300);
    let summary = engine.last_summary().unwrap();
    assert_eq!(summary.attempts, web.total_calls());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dead_pages_are_reported_not_visited() {
    let web = SimulatedWeb::builder(100, 4)
        .seed(3)
        .fail_permanently([5, 6])
        .build()
        .unwrap();
    let engine = CrawlEngine::new(config(8, 3));

    let pages = engine.crawl(&web).await.unwrap();
    let mut failed = engine.failed_nodes();
    failed.sort();

    // Page 1 links to 5..=8, so both dead pages are discovered.
    assert_eq!(failed, vec![5, 6]);
    assert!(!pages.contains(&5) && !pages.contains(&6));
    assert_eq!(web.call_count(5), 3);
    assert_eq!(web.call_count(6), 3);
}

#[tokio::test]
async fn latency_does_not_end_crawl_early() {
    let web = SimulatedWeb::builder(40, 3)
        .seed(1)
        .latency(Duration::from_millis(30))
        .build()
        .unwrap();
    let engine = CrawlEngine::new(config(6, 3));

    let pages = engine.crawl(&web).await.unwrap();

    assert_eq!(pages.len(), 40);
}
