//! Append-only audit sink for completed top-ups.

use crate::domain::transaction::TransactionRecord;
use std::sync::RwLock;
use tracing::info;

/// In-memory transaction log. Records are write-once; nothing here is ever
/// updated or deleted while the process lives.
#[derive(Default)]
pub struct AuditLog {
    entries: RwLock<Vec<TransactionRecord>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, tx: TransactionRecord) {
        info!(
            transaction_id = %tx.id,
            order_id = %tx.order_id,
            identity = %tx.identity,
            amount = tx.amount,
            previous_balance = tx.previous_balance,
            new_balance = tx.new_balance,
            "top-up credited"
        );
        self.entries.write().expect("audit log poisoned").push(tx);
    }

    pub fn entries(&self) -> Vec<TransactionRecord> {
        self.entries.read().expect("audit log poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("audit log poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
