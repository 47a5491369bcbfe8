//! Order domain entity.
//! One in-flight top-up request, tracked from creation to terminal outcome.

use crate::domain::driver::DriverRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an order. Transitions are monotonic toward a terminal
/// state; nothing leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created and waiting for the driver to pay.
    AwaitingPayment,
    /// Gateway reported "still processing"; a self-loop, not terminal.
    Pending,
    Succeeded,
    Expired,
    Failed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Succeeded
                | OrderStatus::Expired
                | OrderStatus::Failed
                | OrderStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::AwaitingPayment => "awaiting_payment",
            OrderStatus::Pending => "pending",
            OrderStatus::Succeeded => "succeeded",
            OrderStatus::Expired => "expired",
            OrderStatus::Failed => "failed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// In-flight top-up order. All fields except `status` are immutable once the
/// order is inserted into the pending table.
#[derive(Debug, Clone)]
pub struct Order {
    pub order_id: String,
    pub identity: String,
    pub amount: i64,
    pub payment_ref: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    /// Directory row captured at creation time. Used for name/email in
    /// receipts; not re-read on completion.
    pub driver_snapshot: DriverRecord,
}

impl Order {
    pub fn new(
        identity: String,
        amount: i64,
        payment_ref: String,
        driver_snapshot: DriverRecord,
    ) -> Self {
        let created_at = Utc::now();
        let order_id = generate_order_id(&identity, created_at);
        Self {
            order_id,
            identity,
            amount,
            payment_ref,
            status: OrderStatus::AwaitingPayment,
            created_at,
            driver_snapshot,
        }
    }
}

/// `TOPUP_<identity>_<millis>_<rand8>`. The random suffix keeps ids unique
/// even for two orders created in the same millisecond.
pub fn generate_order_id(identity: &str, created_at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "TOPUP_{}_{}_{}",
        identity,
        created_at.timestamp_millis(),
        &suffix[..8]
    )
}

/// What the requester gets back after a successful `create_order`: everything
/// needed to render the payment instructions.
#[derive(Debug, Clone, Serialize)]
pub struct OrderTicket {
    pub order_id: String,
    pub payment_ref: String,
    pub amount: i64,
    pub payment_url: String,
    pub qr_code: Option<String>,
    pub expires_at: DateTime<Utc>,
}
