//! Peer extraction
//!
//! A peer is the unit of politeness bookkeeping: one throttle slot per peer.

use url::Url;

/// Extracts the peer key (network location) from a URL
///
/// The peer is the lowercase host, followed by `:port` when the URL names a
/// port other than the scheme's default. All politeness bookkeeping is keyed
/// on this value.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use courier::url::peer_key;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(peer_key(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(peer_key(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn peer_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
