//! Crawler module
//!
//! This module turns a backlog of URLs into fetched pages:
//! - The result handler interface fetched pages are delivered to
//! - The crawl loop that drains the work queue through the fetcher

mod crawl_loop;
mod handler;

pub use crawl_loop::{CrawlLoop, CrawlStats, DEFAULT_MAX_RETRIES};
pub use handler::ResultHandler;
