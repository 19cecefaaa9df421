//! URL parsing and cache-key normalization
//!
//! Queue entries are parsed here before fetching. The normalized form is
//! what the response cache is keyed on.

use crate::UrlError;
use url::Url;

/// Parses a raw URL string into a fetchable URL
///
/// Only `http` and `https` URLs with a host are accepted.
pub fn parse_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(url_str.to_string()));
    }

    Ok(url)
}

/// Normalizes a URL for use as a cache key
///
/// # Normalization Steps
///
/// 1. Lowercase the scheme and host, drop the default port (done by parsing)
/// 2. Remove the fragment, which is never sent to the server
///
/// Path and query are kept verbatim: two URLs that differ there may well
/// return different pages.
pub fn normalize_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized
}

/// Builds the response cache key for a GET of `url`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use courier::url::cache_key;
///
/// let url = Url::parse("HTTPS://Example.com:443/a?b=1#top").unwrap();
/// assert_eq!(cache_key(&url), "GET https://example.com/a?b=1");
/// ```
pub fn cache_key(url: &Url) -> String {
    format!("GET {}", normalize_url(url))
}
