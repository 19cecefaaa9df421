//! Per-peer politeness throttle
//!
//! The throttle remembers when each peer (host) was last accessed and makes
//! the caller wait until the configured delay has passed before the next
//! access to that peer. Each peer has its own lock, held across the wait, so
//! concurrent fetches to one peer are spaced out globally while fetches to
//! other peers proceed untouched.
//!
//! Time is read from `tokio::time`, so tests can pause and advance the clock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Last-access slot for one peer
type PeerSlot = Arc<tokio::sync::Mutex<Option<Instant>>>;

/// Enforces a minimum interval between accesses to the same peer
#[derive(Debug)]
pub struct PolitenessThrottle {
    /// Minimum interval between two accesses to one peer
    delay: Duration,

    /// Peer key -> last access time. Entries are never removed.
    peers: Mutex<HashMap<String, PeerSlot>>,
}

impl PolitenessThrottle {
    /// Creates a throttle with the given per-peer delay
    ///
    /// A zero delay disables waiting; access times are still recorded.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            peers: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits until `peer` may be accessed again, then records the access
    ///
    /// Returns immediately if the peer was never accessed or was last
    /// accessed at least `delay` ago. The new access time is recorded in
    /// every case. The wait cannot be interrupted once entered.
    ///
    /// # Returns
    ///
    /// The time spent sleeping (zero on the non-waiting path)
    pub async fn wait(&self, peer: &str) -> Duration {
        let slot = self.slot(peer);
        let mut last_access = slot.lock().await;

        let mut slept = Duration::ZERO;
        if !self.delay.is_zero() {
            if let Some(last) = *last_access {
                let ready_at = last + self.delay;
                let now = Instant::now();
                if ready_at > now {
                    slept = ready_at - now;
                    tracing::debug!(
                        peer = %peer,
                        sleep_ms = %slept.as_millis(),
                        "Throttling request"
                    );
                    tokio::time::sleep_until(ready_at).await;
                }
            }
        }

        *last_access = Some(Instant::now());
        slept
    }

    /// Returns when `peer` was last accessed, if ever
    pub async fn last_access(&self, peer: &str) -> Option<Instant> {
        let slot = {
            let peers = self.peers.lock().unwrap_or_else(PoisonError::into_inner);
            peers.get(peer).cloned()
        }?;
        let last = *slot.lock().await;
        last
    }

    /// Number of distinct peers seen so far
    pub fn peer_count(&self) -> usize {
        self.peers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Gets or creates the slot for a peer
    fn slot(&self, peer: &str) -> PeerSlot {
        let mut peers = self.peers.lock().unwrap_or_else(PoisonError::into_inner);
        peers
            .entry(peer.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(None)))
            .clone()
    }
}
