//! URL handling module for Courier
//!
//! This module turns raw queue entries into parsed URLs and derives the two
//! keys the fetch engine needs from them: the peer key used for politeness
//! bookkeeping and the request key used by the response cache.

mod normalize;
mod peer;

pub use normalize::{cache_key, normalize_url, parse_url};
pub use peer::peer_key;
