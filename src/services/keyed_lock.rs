//! Per-key async mutual exclusion.
//!
//! Chat commands and webhook deliveries both mutate per-identity state;
//! every operation on an identity serializes through its lock here, so no
//! two can pass an "order exists and is non-terminal" check concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

pub struct KeyedLock {
    entries: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Default for KeyedLock {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyedLock {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Waits for the key's lock. The guard is owned, so it can be held
    /// across awaits for the duration of the critical section.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let entry = self.entry(key);
        let guard = entry.lock_owned().await;
        debug!(key, "acquired key lock");
        guard
    }

    /// Non-blocking variant; `None` when another task holds the key.
    pub fn try_acquire(&self, key: &str) -> Option<OwnedMutexGuard<()>> {
        self.entry(key).try_lock_owned().ok()
    }

    fn entry(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut entries = self.entries.lock().expect("keyed lock mutex poisoned");
        entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Drops entries nobody holds or is waiting on. Called by the sweeper
    /// to keep the registry bounded by the set of active identities.
    pub fn prune(&self) -> usize {
        let mut entries = self.entries.lock().expect("keyed lock mutex poisoned");
        let before = entries.len();
        entries.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - entries.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().expect("keyed lock mutex poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_acquire_release() {
        let locks = KeyedLock::new();
        let guard = locks.acquire("6281234567890").await;
        drop(guard);
        // Re-acquirable after release.
        let _guard = locks.acquire("6281234567890").await;
    }

    #[tokio::test]
    async fn test_same_key_excludes() {
        let locks = KeyedLock::new();
        let guard = locks.acquire("6281234567890").await;
        assert!(locks.try_acquire("6281234567890").is_none());
        drop(guard);
        assert!(locks.try_acquire("6281234567890").is_some());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_exclude() {
        let locks = KeyedLock::new();
        let _a = locks.acquire("6281234567890").await;
        assert!(locks.try_acquire("6289876543210").is_some());
    }

    #[tokio::test]
    async fn test_waiter_proceeds_after_release() {
        let locks = Arc::new(KeyedLock::new());
        let guard = locks.acquire("6281234567890").await;

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = locks2.acquire("6281234567890").await;
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish after release")
            .unwrap();
    }

    #[tokio::test]
    async fn test_prune_drops_idle_entries_only() {
        let locks = KeyedLock::new();
        let guard = locks.acquire("held").await;
        drop(locks.acquire("idle").await);
        assert_eq!(locks.tracked_keys(), 2);

        let pruned = locks.prune();
        assert_eq!(pruned, 1);
        assert_eq!(locks.tracked_keys(), 1);
        drop(guard);
    }
}
