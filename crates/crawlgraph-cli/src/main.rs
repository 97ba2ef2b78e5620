use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crawlgraph_core::config::{
    ENV_BASE_DELAY_MS, ENV_MAX_ATTEMPTS, ENV_QUEUE_TIMEOUT_MS, ENV_WORKERS,
};
use crawlgraph_core::{CrawlConfig, CrawlEngine, CrawlSummary, RetryConfig};
use crawlgraph_sim::SimulatedWeb;

#[derive(Parser, Debug)]
#[command(
    name = "crawlgraph",
    version,
    about = "Crawl a simulated flaky web and check that every page is found"
)]
struct Cli {
    /// Number of pages in the simulated web
    #[arg(default_value_t = 1000)]
    size: u64,

    /// Links per page
    #[arg(default_value_t = 10)]
    degree: u64,

    /// Concurrent crawl workers
    #[arg(short, long, env = ENV_WORKERS, default_value_t = 20)]
    workers: usize,

    /// How long an idle worker waits on an empty frontier before exiting
    #[arg(long, env = ENV_QUEUE_TIMEOUT_MS, default_value_t = 5000)]
    queue_timeout_ms: u64,

    /// Fetch attempts per page before it is reported as failed
    #[arg(long, env = ENV_MAX_ATTEMPTS, default_value_t = 5)]
    max_attempts: u32,

    /// First backoff delay; doubles after every failed attempt
    #[arg(long, env = ENV_BASE_DELAY_MS, default_value_t = 1000)]
    base_delay_ms: u64,

    /// Probability that a single fetch fails transiently
    #[arg(long, default_value_t = 0.0)]
    failure_rate: f64,

    /// Simulated latency of every fetch
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// Pages that never answer (comma separated)
    #[arg(long, value_delimiter = ',')]
    dead: Vec<u64>,

    /// Seed for the link layout and fault injection
    #[arg(long)]
    seed: Option<u64>,

    /// Print a JSON report instead of plain text
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Write logs to this file (truncated) instead of stderr
    #[arg(long, env = "CRAWLGRAPH_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn crawl_config(&self) -> Result<CrawlConfig> {
        let config = CrawlConfig::default()
            .with_workers(self.workers)
            .with_queue_timeout(Duration::from_millis(self.queue_timeout_ms))
            .with_retry(RetryConfig::new(
                self.max_attempts,
                Duration::from_millis(self.base_delay_ms),
            ));
        config.validate().context("Invalid crawl configuration")?;
        Ok(config)
    }

    fn web(&self) -> Result<SimulatedWeb> {
        let mut builder = SimulatedWeb::builder(self.size, self.degree)
            .failure_rate(self.failure_rate)
            .latency(Duration::from_millis(self.latency_ms))
            .fail_permanently(self.dead.iter().copied());
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        builder.build().context("Failed to build simulated web")
    }

    fn log_writer(&self) -> Result<BoxMakeWriter> {
        match &self.log_file {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to open log file {}", path.display()))?;
                Ok(BoxMakeWriter::new(Mutex::new(file)))
            }
            None => Ok(BoxMakeWriter::new(std::io::stderr)),
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    size: u64,
    degree: u64,
    found: usize,
    complete: bool,
    failed_pages: &'a [u64],
    summary: Option<&'a CrawlSummary>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("crawlgraph=info".parse()?))
        .with_target(false)
        .with_ansi(cli.log_file.is_none())
        .with_writer(cli.log_writer()?)
        .init();

    let config = cli.crawl_config()?;
    let web = cli.web()?;

    tracing::info!(
        size = cli.size,
        degree = cli.degree,
        workers = config.workers,
        "Crawling simulated web"
    );

    let engine = CrawlEngine::new(config);
    let start = Instant::now();
    let pages = engine.crawl(&web).await.context("Crawl aborted")?;
    let elapsed = start.elapsed();

    let failed = engine.failed_nodes();
    let summary = engine.last_summary();
    let complete = pages.len() as u64 == cli.size;

    if cli.json {
        let report = Report {
            size: cli.size,
            degree: cli.degree,
            found: pages.len(),
            complete,
            failed_pages: &failed,
            summary: summary.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Time took to crawl the pages: {:.3}s", elapsed.as_secs_f64());
        println!("Number of pages found: {}", pages.len());
        if !failed.is_empty() {
            println!("Pages that failed after retries: {failed:?}");
        }
    }

    if complete {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!(
            expected = cli.size,
            found = pages.len(),
            "Crawl did not reach every page"
        );
        Ok(ExitCode::FAILURE)
    }
}
