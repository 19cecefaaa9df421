//! Courier main entry point
//!
//! This is the command-line interface for filling and draining the shared
//! crawl queue.

use anyhow::Context;
use clap::{Parser, Subcommand};
use courier::cache::open_cache;
use courier::config::{load_config_with_hash, Config};
use courier::output::PageArchive;
use courier::queue::open_queue;
use courier::url::parse_url;
use courier::{CrawlLoop, CrawlStats};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Courier: a polite, cache-aware page fetcher
///
/// URLs are pushed onto a persistent queue with `enqueue` and fetched by one
/// or more `crawl` processes, which respect a per-host delay and reuse
/// cached responses.
#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(version)]
#[command(about = "A polite, cache-aware page fetcher", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Push URLs onto the work queue
    Enqueue {
        /// URLs to enqueue
        #[arg(value_name = "URL")]
        urls: Vec<String>,

        /// Read additional URLs from a file, one per line
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },

    /// Drain the work queue, archiving fetched pages if configured
    Crawl {
        /// Number of concurrent crawl workers
        #[arg(long, default_value_t = 1)]
        workers: usize,
    },

    /// Show queue and cache sizes
    Status,

    /// Delete expired entries from the response cache
    PurgeCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::debug!("Configuration loaded (hash: {})", config_hash);

    match cli.command {
        Command::Enqueue { urls, file } => handle_enqueue(&config, urls, file),
        Command::Crawl { workers } => handle_crawl(&config, workers).await,
        Command::Status => handle_status(&config),
        Command::PurgeCache => handle_purge_cache(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("courier=info,warn"),
            1 => EnvFilter::new("courier=debug,info"),
            2 => EnvFilter::new("courier=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles `enqueue`: validates URLs and pushes them in one batch
fn handle_enqueue(
    config: &Config,
    mut urls: Vec<String>,
    file: Option<PathBuf>,
) -> anyhow::Result<()> {
    if let Some(path) = file {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        urls.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }

    let (valid, invalid): (Vec<String>, Vec<String>) =
        urls.into_iter().partition(|url| parse_url(url).is_ok());
    for url in &invalid {
        tracing::warn!("Skipping invalid URL: {}", url);
    }

    let queue = open_queue(&config.queue)?;
    let added = queue.push(&valid)?;
    println!(
        "Enqueued {} URLs on '{}' ({} skipped, {} pending)",
        added,
        config.queue.name,
        invalid.len(),
        queue.len()?
    );

    Ok(())
}

/// Handles `crawl`: drains the queue with the requested number of workers
async fn handle_crawl(config: &Config, workers: usize) -> anyhow::Result<()> {
    let crawl = CrawlLoop::from_config(config)?;
    tracing::info!(
        "Starting crawl of queue '{}' ({} pending, {} workers)",
        config.queue.name,
        crawl.queue().len()?,
        workers
    );

    let stats: CrawlStats = match &config.output.directory {
        Some(directory) => {
            tracing::info!("Archiving pages to {}", directory);
            crawl
                .run_workers(workers, |_| Ok(PageArchive::open(directory)?))
                .await?
        }
        None => {
            crawl
                .run_workers(workers, |_| {
                    Ok(|_body: Option<&str>, _url: &str| -> anyhow::Result<()> { Ok(()) })
                })
                .await?
        }
    };

    println!(
        "Processed {} URLs: {} fetched ({} from cache), {} failed, {} handler errors",
        stats.processed, stats.succeeded, stats.cache_hits, stats.failed, stats.handler_errors
    );

    Ok(())
}

/// Handles `status`: prints queue and cache sizes
fn handle_status(config: &Config) -> anyhow::Result<()> {
    let queue = open_queue(&config.queue)?;
    println!("Queue '{}' ({})", config.queue.name, config.queue.database_path);
    println!("  Pending URLs: {}", queue.len()?);

    if config.cache.enabled {
        let cache = open_cache(&config.cache)?;
        println!("Cache ({})", config.cache.database_path);
        println!("  Entries: {}", cache.len()?);
        println!("  TTL: {}s", config.cache.ttl_secs);
    } else {
        println!("Cache disabled");
    }

    Ok(())
}

/// Handles `purge-cache`: removes expired responses
fn handle_purge_cache(config: &Config) -> anyhow::Result<()> {
    let cache = open_cache(&config.cache)?;
    let removed = cache.purge_expired()?;
    println!("Removed {} expired cache entries", removed);
    Ok(())
}
