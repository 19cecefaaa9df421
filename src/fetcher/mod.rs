//! Fetcher module
//!
//! This module performs the actual page downloads:
//! - Request and result types with the success/failure classification
//! - HTTP clients, one per proxy route
//! - The fetch engine: cache check, politeness wait, GET, retry on 5xx

mod client;
mod engine;
mod request;

pub use client::{build_http_client, ClientPool};
pub use engine::Fetcher;
pub use request::{FetchOutcome, FetchRequest, FetchResult};
