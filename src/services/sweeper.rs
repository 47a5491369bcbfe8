//! Background eviction for the rate-limit map and the lock registry.
//!
//! Both structures grow with every identity ever seen; the sweep keeps them
//! bounded by the set of recently active identities.

use crate::services::keyed_lock::KeyedLock;
use crate::services::rate_limit::RateLimiter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

const SWEEP_INTERVAL_SECS: u64 = 60;

/// Runs the eviction loop. Spawned once at startup; runs for the process
/// lifetime without blocking the HTTP server.
pub async fn run_sweeper(rate_limiter: Arc<RateLimiter>, locks: Arc<KeyedLock>) {
    info!("rate limit sweeper started");

    loop {
        sleep(Duration::from_secs(SWEEP_INTERVAL_SECS)).await;

        let evicted = rate_limiter.evict_expired();
        let pruned = locks.prune();

        if evicted > 0 || pruned > 0 {
            debug!(evicted, pruned, "sweep pass removed idle entries");
        }
    }
}
