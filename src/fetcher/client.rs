//! HTTP client construction
//!
//! reqwest binds proxies to the client, not to the request, so the fetcher
//! keeps one client per distinct proxy map and reuses it.

use crate::config::ProxyConfig;
use crate::CourierError;
use reqwest::{Client, Proxy};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Upper bound on establishing a connection, independent of request timeouts
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds an HTTP client, optionally routed through a proxy
///
/// The client sends no default User-Agent; every header comes from the
/// request. Redirects follow reqwest's default policy.
///
/// # Arguments
///
/// * `proxy` - Proxy endpoints keyed by scheme, or `None` for direct access
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(CourierError)` - A proxy endpoint was invalid or the client failed to build
pub fn build_http_client(proxy: Option<&ProxyConfig>) -> Result<Client, CourierError> {
    let mut builder = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        if let Some(endpoint) = &proxy.http {
            let http = Proxy::http(endpoint.as_str()).map_err(|source| CourierError::Proxy {
                endpoint: endpoint.clone(),
                source,
            })?;
            builder = builder.proxy(http);
        }
        if let Some(endpoint) = &proxy.https {
            let https = Proxy::https(endpoint.as_str()).map_err(|source| CourierError::Proxy {
                endpoint: endpoint.clone(),
                source,
            })?;
            builder = builder.proxy(https);
        }
    }

    Ok(builder.build()?)
}

/// Clients keyed by the proxy map they route through
#[derive(Debug, Default)]
pub struct ClientPool {
    clients: Mutex<HashMap<Option<ProxyConfig>, Client>>,
}

impl ClientPool {
    /// Creates a pool pre-populated with a direct client and one per proxy
    pub fn with_proxies(proxies: &[ProxyConfig]) -> Result<Self, CourierError> {
        let mut clients = HashMap::new();
        clients.insert(None, build_http_client(None)?);
        for proxy in proxies {
            clients.insert(Some(proxy.clone()), build_http_client(Some(proxy))?);
        }
        Ok(Self {
            clients: Mutex::new(clients),
        })
    }

    /// Returns the client for `proxy`, building it on first use
    pub fn get(&self, proxy: Option<&ProxyConfig>) -> Result<Client, CourierError> {
        let key = proxy.cloned();
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        let client = build_http_client(proxy)?;
        clients.insert(key, client.clone());
        Ok(client)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
