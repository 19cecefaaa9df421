//! Output module for persisting crawl results
//!
//! This module provides result handlers that store what the crawl loop
//! fetched. The page archive keeps every fetched body on disk together with
//! an index mapping file names back to URLs.

mod archive;

pub use archive::{archive_file_name, PageArchive, INDEX_FILE_NAME};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
