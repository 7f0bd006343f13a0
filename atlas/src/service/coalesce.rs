//! Single-flight origin fetches.
//!
//! When several requests miss the cache for the same tile, only the first
//! one fetches it from the origin. The others subscribe to its outcome.
//!
//! ```text
//! request ──► register(key) ──┬── NewRequest(guard) ──► fetch ──► guard.complete(outcome)
//!                             │                                          │
//!                             └── Coalesced(rx) ◄──── broadcast ─────────┘
//! ```
//!
//! A leader dropped before completing (cancelled request, panic) wakes its
//! followers with [`FetchError::Abandoned`].

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::trace;

use crate::provider::FetchError;

/// Result of one origin fetch, shared with every waiter.
pub type FetchOutcome = Result<Bytes, FetchError>;

/// Outcome of [`FetchCoalescer::register`].
pub enum CoalesceResult<'a> {
    /// Another request is already fetching this key.
    Coalesced(broadcast::Receiver<FetchOutcome>),
    /// The caller must fetch and then complete the guard.
    NewRequest(LeaderGuard<'a>),
}

/// Counters for coalescing activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoalescerStats {
    pub leaders: u64,
    pub coalesced: u64,
    pub in_flight: usize,
}

/// In-flight fetches keyed by tile.
#[derive(Debug, Default)]
pub struct FetchCoalescer {
    in_flight: DashMap<String, broadcast::Sender<FetchOutcome>>,
    leaders: AtomicU64,
    coalesced: AtomicU64,
}

impl FetchCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the fetch for `key`, or starts one.
    pub fn register(&self, key: &str) -> CoalesceResult<'_> {
        match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                self.coalesced.fetch_add(1, Ordering::Relaxed);
                trace!(key, "joining in-flight fetch");
                CoalesceResult::Coalesced(entry.get().subscribe())
            }
            Entry::Vacant(entry) => {
                let (tx, _) = broadcast::channel(1);
                entry.insert(tx);
                self.leaders.fetch_add(1, Ordering::Relaxed);
                CoalesceResult::NewRequest(LeaderGuard {
                    coalescer: self,
                    key: key.to_string(),
                    done: false,
                })
            }
        }
    }

    /// Number of keys currently being fetched.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn stats(&self) -> CoalescerStats {
        CoalescerStats {
            leaders: self.leaders.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            in_flight: self.in_flight.len(),
        }
    }

    fn finish(&self, key: &str, outcome: FetchOutcome) {
        // No receiver may subscribe after the send.
        if let Some((_, tx)) = self.in_flight.remove(key) {
            let waiters = tx.send(outcome).unwrap_or(0);
            trace!(key, waiters, "fetch completed");
        }
    }
}

/// Ownership of one in-flight fetch.
pub struct LeaderGuard<'a> {
    coalescer: &'a FetchCoalescer,
    key: String,
    done: bool,
}

impl LeaderGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Publishes the outcome to every follower.
    pub fn complete(mut self, outcome: FetchOutcome) {
        self.done = true;
        self.coalescer.finish(&self.key, outcome);
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.coalescer.finish(&self.key, Err(FetchError::Abandoned));
        }
    }
}

/// Waits for the leader's outcome.
pub async fn wait_for(mut rx: broadcast::Receiver<FetchOutcome>) -> FetchOutcome {
    rx.recv().await.unwrap_or(Err(FetchError::Abandoned))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_followers_receive_leader_outcome() {
        let coalescer = FetchCoalescer::new();

        let leader = match coalescer.register("osm/1-2-3.jpg") {
            CoalesceResult::NewRequest(guard) => guard,
            CoalesceResult::Coalesced(_) => panic!("first registration must lead"),
        };
        let followers: Vec<_> = (0..3)
            .map(|_| match coalescer.register("osm/1-2-3.jpg") {
                CoalesceResult::Coalesced(rx) => rx,
                CoalesceResult::NewRequest(_) => panic!("key is in flight"),
            })
            .collect();
        assert_eq!(coalescer.in_flight(), 1);

        leader.complete(Ok(Bytes::from_static(b"tile")));
        assert_eq!(coalescer.in_flight(), 0);

        for rx in followers {
            assert_eq!(wait_for(rx).await.unwrap(), Bytes::from_static(b"tile"));
        }
        assert_eq!(
            coalescer.stats(),
            CoalescerStats {
                leaders: 1,
                coalesced: 3,
                in_flight: 0
            }
        );
    }

    #[tokio::test]
    async fn test_dropped_leader_abandons_followers() {
        let coalescer = FetchCoalescer::new();

        let leader = coalescer.register("k");
        let rx = match coalescer.register("k") {
            CoalesceResult::Coalesced(rx) => rx,
            CoalesceResult::NewRequest(_) => panic!("key is in flight"),
        };
        drop(leader);

        assert_eq!(wait_for(rx).await, Err(FetchError::Abandoned));
        assert_eq!(coalescer.in_flight(), 0);
    }

    #[test]
    fn test_key_is_free_after_completion() {
        let coalescer = FetchCoalescer::new();
        if let CoalesceResult::NewRequest(guard) = coalescer.register("k") {
            guard.complete(Err(FetchError::Offline));
        }
        assert!(matches!(coalescer.register("k"), CoalesceResult::NewRequest(_)));
    }

    #[test]
    fn test_distinct_keys_lead_independently() {
        let coalescer = FetchCoalescer::new();
        let a = coalescer.register("a");
        let b = coalescer.register("b");
        assert!(matches!(a, CoalesceResult::NewRequest(_)));
        assert!(matches!(b, CoalesceResult::NewRequest(_)));
        assert_eq!(coalescer.in_flight(), 2);
    }
}
