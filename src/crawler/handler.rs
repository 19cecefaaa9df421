//! Result handler trait
//!
//! A result handler receives every popped URL together with what was
//! fetched for it. It typically extracts data from the page and persists it.

/// Consumer of fetched pages
///
/// `body` is `None` when nothing usable was fetched (client, server or
/// network error); the handler decides whether that matters. An `Err`
/// return is logged by the crawl loop and never stops it.
pub trait ResultHandler: Send {
    fn handle(&mut self, body: Option<&str>, url: &str) -> anyhow::Result<()>;
}

impl<F> ResultHandler for F
where
    F: FnMut(Option<&str>, &str) -> anyhow::Result<()> + Send,
{
    fn handle(&mut self, body: Option<&str>, url: &str) -> anyhow::Result<()> {
        self(body, url)
    }
}
