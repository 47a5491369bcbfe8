//! Completed top-up audit record.
//! Write-once; emitted to the audit sink after the balance write succeeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub order_id: String,
    pub payment_ref: String,
    pub identity: String,
    pub driver_name: String,
    pub amount: i64,
    pub previous_balance: i64,
    pub new_balance: i64,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the top-up was credited.
    pub completed_at: DateTime<Utc>,
}

impl TransactionRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: String,
        payment_ref: String,
        identity: String,
        driver_name: String,
        amount: i64,
        previous_balance: i64,
        new_balance: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            payment_ref,
            identity,
            driver_name,
            amount,
            previous_balance,
            new_balance,
            created_at,
            completed_at: Utc::now(),
        }
    }
}
