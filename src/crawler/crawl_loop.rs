//! Queue-driven crawl loop
//!
//! The loop drains the work queue one URL at a time: pop, fetch, hand the
//! result to the handler. Several loops may drain the same queue at once
//! (as tasks here, or as separate processes against the same database).
//!
//! The loop checks the queue length before every pop and stops the first
//! time it sees an empty queue. URLs pushed by another producer after that
//! moment stay in the queue until a loop is started again.

use crate::config::Config;
use crate::crawler::handler::ResultHandler;
use crate::fetcher::{FetchResult, Fetcher};
use crate::queue::{open_queue, pop_with, PopMode, WorkQueue};
use crate::CourierError;
use std::ops::AddAssign;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Retry bound used for 5xx responses unless configured otherwise
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Counters describing one drain of the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// URLs popped and passed to the handler
    pub processed: u64,

    /// URLs that produced a body
    pub succeeded: u64,

    /// URLs that produced no body
    pub failed: u64,

    /// Successful URLs served from the response cache
    pub cache_hits: u64,

    /// Handler invocations that returned an error
    pub handler_errors: u64,
}

impl CrawlStats {
    fn record(&mut self, result: Option<&FetchResult>) {
        self.processed += 1;
        match result {
            Some(result) if result.is_success() => {
                self.succeeded += 1;
                if result.from_cache() {
                    self.cache_hits += 1;
                }
            }
            _ => self.failed += 1,
        }
    }
}

impl AddAssign for CrawlStats {
    fn add_assign(&mut self, other: Self) {
        self.processed += other.processed;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.cache_hits += other.cache_hits;
        self.handler_errors += other.handler_errors;
    }
}

/// Drains a work queue through a fetcher
#[derive(Clone)]
pub struct CrawlLoop {
    queue: Arc<dyn WorkQueue>,
    fetcher: Arc<Fetcher>,
    max_retries: u32,
    pop_mode: PopMode,
}

impl CrawlLoop {
    /// Creates a loop with the default retry bound and non-blocking pops
    pub fn new(queue: Arc<dyn WorkQueue>, fetcher: Arc<Fetcher>) -> Self {
        Self {
            queue,
            fetcher,
            max_retries: DEFAULT_MAX_RETRIES,
            pop_mode: PopMode::Immediate,
        }
    }

    /// Opens the queue, cache and fetcher described by the configuration
    pub fn from_config(config: &Config) -> Result<Self, CourierError> {
        let queue = open_queue(&config.queue)?;
        let fetcher = Arc::new(Fetcher::from_config(config)?);
        Ok(Self::new(queue, fetcher)
            .with_max_retries(config.fetcher.max_retries)
            .with_pop_mode(PopMode::from_config(&config.queue)))
    }

    /// Sets how many times a 5xx response is retried
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets how a pop behaves on an empty queue
    pub fn with_pop_mode(mut self, pop_mode: PopMode) -> Self {
        self.pop_mode = pop_mode;
        self
    }

    pub fn queue(&self) -> &Arc<dyn WorkQueue> {
        &self.queue
    }

    pub fn fetcher(&self) -> &Arc<Fetcher> {
        &self.fetcher
    }

    /// Drains the queue until it is observed empty
    ///
    /// Every popped URL is fetched and, if a handler is given, passed to it
    /// together with the body (or `None`). Failed URLs are not re-queued.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStats)` - The queue was observed empty
    /// * `Err(CourierError)` - The queue or cache backend failed
    pub async fn run(
        &self,
        mut handler: Option<&mut dyn ResultHandler>,
    ) -> Result<CrawlStats, CourierError> {
        let start_time = Instant::now();
        let mut stats = CrawlStats::default();

        while self.queue.len()? > 0 {
            let Some(url) = pop_with(self.queue.as_ref(), self.pop_mode).await? else {
                // Another worker took the last item between len() and pop()
                continue;
            };
            tracing::debug!("Processing URL: {}", url);

            let result = match self.fetcher.get(&url, self.max_retries).await {
                Ok(result) => Some(result),
                Err(CourierError::Url(e)) => {
                    tracing::warn!("Skipping malformed URL {}: {}", url, e);
                    None
                }
                Err(e) => return Err(e),
            };
            stats.record(result.as_ref());

            if let Some(handler) = handler.as_deref_mut() {
                let body = result.as_ref().and_then(FetchResult::body);
                if let Err(e) = handler.handle(body, &url) {
                    tracing::warn!("Result handler failed for {}: {:#}", url, e);
                    stats.handler_errors += 1;
                }
            }

            if stats.processed % 10 == 0 {
                let elapsed = start_time.elapsed();
                tracing::info!(
                    "Progress: {} URLs processed, {} in queue, {:.2} URLs/sec",
                    stats.processed,
                    self.queue.len()?,
                    stats.processed as f64 / elapsed.as_secs_f64()
                );
            }
        }

        tracing::info!(
            "Queue drained: {} URLs processed ({} ok, {} failed, {} from cache) in {:?}",
            stats.processed,
            stats.succeeded,
            stats.failed,
            stats.cache_hits,
            start_time.elapsed()
        );

        Ok(stats)
    }

    /// Drains the queue with `workers` concurrent loops
    ///
    /// All workers share this loop's queue and fetcher, so the politeness
    /// delay holds across them. `make_handler` is called once per worker
    /// with the worker index, before any worker starts.
    ///
    /// # Returns
    ///
    /// The summed statistics, or the first error any worker hit
    pub async fn run_workers<H, F>(
        &self,
        workers: usize,
        make_handler: F,
    ) -> Result<CrawlStats, CourierError>
    where
        H: ResultHandler + 'static,
        F: FnMut(usize) -> Result<H, CourierError>,
    {
        let handlers = (0..workers.max(1))
            .map(make_handler)
            .collect::<Result<Vec<H>, CourierError>>()?;

        let mut tasks = JoinSet::new();
        for (id, mut handler) in handlers.into_iter().enumerate() {
            let worker = self.clone();
            tasks.spawn(async move {
                tracing::debug!("Worker {} started", id);
                let handler: &mut dyn ResultHandler = &mut handler;
                worker.run(Some(handler)).await
            });
        }

        let mut total = CrawlStats::default();
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(stats)) => total += stats,
                Ok(Err(e)) => {
                    tracing::error!("Worker failed: {}", e);
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!("Worker task aborted: {}", e);
                    first_error.get_or_insert(CourierError::Worker(e.to_string()));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(total),
        }
    }
}
