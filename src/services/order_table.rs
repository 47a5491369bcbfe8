//! In-memory pending order table.
//!
//! Single source of truth for in-flight top-up state: a sharded arena keyed
//! by order id, an identity index enforcing the one-non-terminal-order-per-
//! identity invariant, and a terminal registry recording how each finished
//! order ended. The live shards never hold a terminal order; removal and
//! registry append happen under the same lock.

use crate::domain::order::{Order, OrderStatus};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;

const SHARD_COUNT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    /// The identity already has a live order.
    IdentityBusy,
    /// The order id was seen before (live or already finalized).
    DuplicateOrderId,
}

pub struct PendingOrderTable {
    shards: Vec<RwLock<HashMap<String, Order>>>,
    /// identity -> live order id.
    by_identity: RwLock<HashMap<String, String>>,
    /// order id -> terminal status, append-only for the process lifetime.
    finalized: RwLock<HashMap<String, OrderStatus>>,
}

impl Default for PendingOrderTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingOrderTable {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT)
                .map(|_| RwLock::new(HashMap::new()))
                .collect(),
            by_identity: RwLock::new(HashMap::new()),
            finalized: RwLock::new(HashMap::new()),
        }
    }

    fn shard(&self, order_id: &str) -> &RwLock<HashMap<String, Order>> {
        let mut hasher = DefaultHasher::new();
        order_id.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARD_COUNT]
    }

    /// Inserts a new live order, enforcing both uniqueness invariants.
    pub fn insert(&self, order: Order) -> Result<(), InsertError> {
        debug_assert!(!order.status.is_terminal());

        let mut index = self.by_identity.write().expect("identity index poisoned");
        if index.contains_key(&order.identity) {
            return Err(InsertError::IdentityBusy);
        }
        if self
            .finalized
            .read()
            .expect("terminal registry poisoned")
            .contains_key(&order.order_id)
        {
            return Err(InsertError::DuplicateOrderId);
        }

        let mut shard = self.shard(&order.order_id).write().expect("shard poisoned");
        if shard.contains_key(&order.order_id) {
            return Err(InsertError::DuplicateOrderId);
        }
        index.insert(order.identity.clone(), order.order_id.clone());
        shard.insert(order.order_id.clone(), order);
        Ok(())
    }

    pub fn get(&self, order_id: &str) -> Option<Order> {
        self.shard(order_id)
            .read()
            .expect("shard poisoned")
            .get(order_id)
            .cloned()
    }

    /// The identity's live order, if any.
    pub fn find_by_identity(&self, identity: &str) -> Option<Order> {
        let order_id = self
            .by_identity
            .read()
            .expect("identity index poisoned")
            .get(identity)
            .cloned()?;
        self.get(&order_id)
    }

    /// In-place status update for non-terminal transitions (the Pending
    /// self-loop). Terminal transitions must go through `finalize`.
    pub fn update_status(&self, order_id: &str, status: OrderStatus) -> bool {
        debug_assert!(!status.is_terminal());
        let mut shard = self.shard(order_id).write().expect("shard poisoned");
        match shard.get_mut(order_id) {
            Some(order) => {
                order.status = status;
                true
            }
            None => false,
        }
    }

    /// Atomically removes a live order and records its terminal status in
    /// the registry. Returns the removed order.
    pub fn finalize(&self, order_id: &str, status: OrderStatus) -> Option<Order> {
        debug_assert!(status.is_terminal());

        let mut index = self.by_identity.write().expect("identity index poisoned");
        let mut shard = self.shard(order_id).write().expect("shard poisoned");
        let mut order = shard.remove(order_id)?;
        index.remove(&order.identity);
        order.status = status;
        self.finalized
            .write()
            .expect("terminal registry poisoned")
            .insert(order_id.to_string(), status);
        Some(order)
    }

    /// How a finished order ended, if this process finished it.
    pub fn finalized_status(&self, order_id: &str) -> Option<OrderStatus> {
        self.finalized
            .read()
            .expect("terminal registry poisoned")
            .get(order_id)
            .copied()
    }

    pub fn live_count(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.read().expect("shard poisoned").len())
            .sum()
    }
}
