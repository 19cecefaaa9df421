//! On-disk page archive
//!
//! Layout of the archive directory:
//!
//! ```text
//! <directory>/
//!   index.tsv              one "<file stem>\t<url>" line per saved page
//!   <sha256(url)>.html     the page body
//! ```
//!
//! Several archives may point at the same directory (one per crawl
//! worker). Index lines are appended with a single write each.

use crate::crawler::ResultHandler;
use crate::output::{OutputError, OutputResult};
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the index file inside the archive directory
pub const INDEX_FILE_NAME: &str = "index.tsv";

/// Returns the file name a page fetched from `url` is stored under
pub fn archive_file_name(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{}.html", hex::encode(hasher.finalize()))
}

/// Result handler that writes fetched pages to a directory
pub struct PageArchive {
    directory: PathBuf,
    index: File,
    saved: u64,
}

impl PageArchive {
    /// Opens (creating if necessary) an archive directory
    pub fn open<P: AsRef<Path>>(directory: P) -> OutputResult<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;

        let index = OpenOptions::new()
            .create(true)
            .append(true)
            .open(directory.join(INDEX_FILE_NAME))?;

        tracing::debug!("Opened page archive at {}", directory.display());
        Ok(Self {
            directory,
            index,
            saved: 0,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path the page for `url` is (or would be) stored at
    pub fn page_path(&self, url: &str) -> PathBuf {
        self.directory.join(archive_file_name(url))
    }

    /// Number of pages this archive instance has written
    pub fn saved(&self) -> u64 {
        self.saved
    }

    /// Writes one page and its index line
    ///
    /// Re-saving a URL overwrites the page file and appends another index
    /// line.
    pub fn save(&mut self, url: &str, body: &str) -> OutputResult<PathBuf> {
        if url.contains(['\t', '\n']) {
            return Err(OutputError::Write(format!(
                "URL cannot be indexed: {:?}",
                url
            )));
        }

        let file_name = archive_file_name(url);
        let path = self.directory.join(&file_name);
        fs::write(&path, body)?;

        let stem = file_name.trim_end_matches(".html");
        let line = format!("{}\t{}\n", stem, url);
        self.index.write_all(line.as_bytes())?;

        self.saved += 1;
        Ok(path)
    }
}

impl ResultHandler for PageArchive {
    fn handle(&mut self, body: Option<&str>, url: &str) -> anyhow::Result<()> {
        let Some(body) = body else {
            tracing::debug!("Nothing to archive for {}", url);
            return Ok(());
        };

        let path = self.save(url, body)?;
        tracing::debug!("Archived {} to {}", url, path.display());
        Ok(())
    }
}
