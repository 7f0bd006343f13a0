//! Periodic cache eviction.
//!
//! The [`SweepDaemon`] walks every server's [`DiskTileCache`] on a fixed
//! interval and trims it to budget. It shares nothing with request handling
//! except the filesystem, and stops when its cancellation token fires.
//!
//! # Example
//!
//! ```ignore
//! use atlas::cache::{DiskTileCache, SweepDaemon};
//! use tokio_util::sync::CancellationToken;
//!
//! let daemon = SweepDaemon::new(caches, SweepDaemon::DEFAULT_INTERVAL);
//! let shutdown = CancellationToken::new();
//! tokio::spawn(daemon.run(shutdown.clone()));
//! // ...
//! shutdown.cancel();
//! ```

use std::time::Duration;

use futures::future::join_all;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{DiskTileCache, SweepResult};

/// Background task that keeps every server's cache within budget.
#[derive(Debug, Clone)]
pub struct SweepDaemon {
    caches: Vec<(String, DiskTileCache)>,
    interval: Duration,
}

impl SweepDaemon {
    /// Default time between sweeps.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

    /// Creates a daemon over `(server id, cache)` pairs.
    pub fn new(caches: Vec<(String, DiskTileCache)>, interval: Duration) -> Self {
        Self {
            caches,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sweeps every budgeted cache once.
    ///
    /// A folder that cannot be read is logged and skipped for this cycle.
    pub async fn sweep_all(&self) -> Vec<(String, SweepResult)> {
        let sweeps = self
            .caches
            .iter()
            .filter(|(_, cache)| cache.budget() > 0)
            .map(|(id, cache)| async move { (id, cache, cache.evict_to_budget().await) });

        let mut results = Vec::with_capacity(self.caches.len());
        for (id, cache, outcome) in join_all(sweeps).await {
            match outcome {
                Ok(result) => {
                    if result.files_removed > 0 {
                        info!(server = %id, "{}", result);
                    } else {
                        debug!(server = %id, "{}", result);
                    }
                    results.push((id.clone(), result));
                }
                Err(e) => {
                    warn!(server = %id, folder = %cache.folder().display(), error = %e, "cache sweep skipped");
                }
            }
        }
        results
    }

    /// Runs until `shutdown` is cancelled, sweeping immediately and then
    /// once per interval.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(interval_secs = self.interval.as_secs(), caches = self.caches.len(), "cache sweep daemon started");
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!("cache sweep daemon cancelled");
                    break;
                }

                _ = ticker.tick() => {
                    self.sweep_all().await;
                }
            }
        }
    }
}
