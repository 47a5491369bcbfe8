//! Order orchestration: the state machine between chat commands and gateway
//! callbacks.
//!
//! `create_order` admits a request and opens an order; `apply_gateway_event`
//! reconciles an authenticated callback against the pending table. Both
//! serialize per identity through the keyed lock, so a command racing a
//! callback (or two callbacks racing each other) can never both pass the
//! "order exists and is non-terminal" check.

use crate::directory::{DirectoryError, DriverDirectory};
use crate::domain::order::{Order, OrderStatus, OrderTicket};
use crate::domain::transaction::TransactionRecord;
use crate::gateway::{GatewayError, GatewayEvent, GatewayEventKind, PaymentGateway, PaymentRequest};
use crate::services::admission::{self, AdmissionError};
use crate::services::audit::AuditLog;
use crate::services::keyed_lock::KeyedLock;
use crate::services::order_table::PendingOrderTable;
use crate::services::rate_limit::{Decision, RateLimiter};
use crate::transport::{messages, Notifier};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum CreateOrderError {
    #[error(transparent)]
    Admission(#[from] AdmissionError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("no pending order for this id")]
    OrderNotFound,
    #[error("order already reached a terminal state")]
    AlreadyFinalized,
    #[error("balance update failed; order held open: {0}")]
    DirectoryWriteFailure(String),
    #[error("balance arithmetic overflow")]
    BalanceOverflow,
}

pub struct Orchestrator {
    table: PendingOrderTable,
    rate_limiter: Arc<RateLimiter>,
    locks: Arc<KeyedLock>,
    audit: AuditLog,
    directory: Arc<dyn DriverDirectory>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    gateway_timeout: Duration,
    directory_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        directory: Arc<dyn DriverDirectory>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        rate_limiter: Arc<RateLimiter>,
        locks: Arc<KeyedLock>,
        gateway_timeout: Duration,
        directory_timeout: Duration,
    ) -> Self {
        Self {
            table: PendingOrderTable::new(),
            rate_limiter,
            locks,
            audit: AuditLog::new(),
            directory,
            gateway,
            notifier,
            gateway_timeout,
            directory_timeout,
        }
    }

    /// Admits a top-up request and opens an order.
    ///
    /// Gate order: admission validation, rate limit, duplicate-pending
    /// guard, directory lookup, gateway create. The rate limiter runs before
    /// the duplicate guard, so a duplicate rejection still consumes a
    /// rate-limit slot; the two gates are deliberately independent.
    pub async fn create_order(
        &self,
        raw_identity: &str,
        amount: i64,
    ) -> Result<OrderTicket, CreateOrderError> {
        let (identity, amount) = admission::validate(raw_identity, amount)?;

        let _guard = self.locks.acquire(&identity).await;

        if self.rate_limiter.check_and_record(&identity) == Decision::Denied {
            info!(%identity, "top-up request rate limited");
            return Err(AdmissionError::RateLimited.into());
        }

        if self.table.find_by_identity(&identity).is_some() {
            return Err(AdmissionError::DuplicatePending.into());
        }

        let driver = self
            .directory_lookup(&identity)
            .await?
            .ok_or(AdmissionError::UnknownDriver)?;

        // No table insert before this point: a gateway failure must leave
        // no partial state behind.
        let order = Order::new(identity.clone(), amount, String::new(), driver.clone());
        let request = PaymentRequest {
            order_id: order.order_id.clone(),
            amount,
            customer_name: driver.name.clone(),
            customer_phone: identity.clone(),
            customer_email: driver.contact_email(),
            description: format!("Driver top-up {}", driver.name),
        };

        let handle = tokio::time::timeout(
            self.gateway_timeout,
            self.gateway.create_payment(&request),
        )
        .await
        .map_err(|_| GatewayError::Timeout)??;

        let order = Order {
            payment_ref: handle.payment_ref.clone(),
            ..order
        };
        let order_id = order.order_id.clone();

        if let Err(err) = self.table.insert(order) {
            // The identity lock makes this unreachable in practice; fail
            // closed rather than double-book if it ever fires.
            error!(?err, %order_id, "pending table rejected freshly created order");
            return Err(AdmissionError::DuplicatePending.into());
        }

        info!(%identity, %order_id, amount, "top-up order created");

        Ok(OrderTicket {
            order_id,
            payment_ref: handle.payment_ref,
            amount,
            payment_url: handle.payment_url,
            qr_code: handle.qr_code,
            expires_at: handle.expires_at,
        })
    }

    /// Reconciles one authenticated gateway event against the pending table,
    /// driving the order to its next (possibly terminal) state.
    pub async fn apply_gateway_event(&self, event: GatewayEvent) -> Result<(), ReconcileError> {
        // Resolve the owning identity first, then serialize on it and
        // re-check: the order may have been reconciled while we waited.
        let identity = match self.table.get(&event.order_id) {
            Some(order) => order.identity,
            None => return self.reject_unknown(&event),
        };

        let _guard = self.locks.acquire(&identity).await;

        let order = match self.table.get(&event.order_id) {
            Some(order) => order,
            None => return self.reject_unknown(&event),
        };

        match event.kind {
            GatewayEventKind::Success { amount } => self.reconcile_success(order, &event, amount).await,
            GatewayEventKind::Pending => self.reconcile_pending(order, &event).await,
            GatewayEventKind::Expired => {
                self.reconcile_terminal(order, &event, OrderStatus::Expired).await
            }
            GatewayEventKind::Failed => {
                self.reconcile_terminal(order, &event, OrderStatus::Failed).await
            }
            GatewayEventKind::Cancelled => {
                self.reconcile_terminal(order, &event, OrderStatus::Cancelled).await
            }
        }
    }

    /// Unknown order id: either a duplicate/late event for an order this
    /// process already finished (`AlreadyFinalized`) or an id we never knew
    /// (`OrderNotFound`). Both are idempotent no-ops for the caller.
    fn reject_unknown(&self, event: &GatewayEvent) -> Result<(), ReconcileError> {
        match self.table.finalized_status(&event.order_id) {
            Some(status) => {
                info!(
                    order_id = %event.order_id,
                    event = event.kind.as_str(),
                    terminal = status.as_str(),
                    "event for finalized order ignored"
                );
                Err(ReconcileError::AlreadyFinalized)
            }
            None => {
                warn!(
                    order_id = %event.order_id,
                    event = event.kind.as_str(),
                    "event for unknown order ignored"
                );
                Err(ReconcileError::OrderNotFound)
            }
        }
    }

    async fn reconcile_success(
        &self,
        order: Order,
        event: &GatewayEvent,
        amount: i64,
    ) -> Result<(), ReconcileError> {
        if amount != order.amount {
            warn!(
                order_id = %order.order_id,
                order_amount = order.amount,
                event_amount = amount,
                "gateway success amount diverges from order; crediting event amount"
            );
        }

        // Fresh balance read: the snapshot is for receipts, not arithmetic.
        let current = match self.directory_lookup(&order.identity).await {
            Ok(Some(record)) => record.balance,
            Ok(None) => {
                return self
                    .hold_order_open(&order, event, "directory row disappeared")
                    .await
            }
            Err(err) => return self.hold_order_open(&order, event, &err.to_string()).await,
        };

        let new_balance = current
            .checked_add(amount)
            .ok_or(ReconcileError::BalanceOverflow)?;

        let write = tokio::time::timeout(
            self.directory_timeout,
            self.directory.update_balance(&order.identity, new_balance),
        )
        .await
        .map_err(|_| DirectoryError::Timeout)
        .and_then(|r| r);

        if let Err(err) = write {
            return self.hold_order_open(&order, event, &err.to_string()).await;
        }

        self.audit.record(TransactionRecord::new(
            order.order_id.clone(),
            event.payment_ref.clone(),
            order.identity.clone(),
            order.driver_snapshot.name.clone(),
            amount,
            current,
            new_balance,
            order.created_at,
        ));

        self.table.finalize(&order.order_id, OrderStatus::Succeeded);

        info!(
            order_id = %order.order_id,
            identity = %order.identity,
            amount,
            new_balance,
            "top-up succeeded"
        );

        self.notify_both(
            &order.identity,
            messages::topup_success(amount, new_balance, &order.order_id, Utc::now()),
            messages::operator_event(
                "success",
                &order.order_id,
                &event.payment_ref,
                &order.identity,
                amount,
                Some(&format!("new balance Rp {}", new_balance)),
            ),
        )
        .await;

        Ok(())
    }

    async fn reconcile_pending(&self, order: Order, event: &GatewayEvent) -> Result<(), ReconcileError> {
        self.table.update_status(&order.order_id, OrderStatus::Pending);
        info!(order_id = %order.order_id, "payment still processing");

        self.notify_both(
            &order.identity,
            messages::topup_processing(order.amount),
            messages::operator_event(
                "pending",
                &order.order_id,
                &event.payment_ref,
                &order.identity,
                order.amount,
                None,
            ),
        )
        .await;

        Ok(())
    }

    async fn reconcile_terminal(
        &self,
        order: Order,
        event: &GatewayEvent,
        status: OrderStatus,
    ) -> Result<(), ReconcileError> {
        self.table.finalize(&order.order_id, status);
        info!(order_id = %order.order_id, status = status.as_str(), "order closed without credit");

        let driver_text = match status {
            OrderStatus::Expired => messages::topup_expired(order.amount),
            OrderStatus::Cancelled => messages::topup_cancelled(order.amount),
            _ => messages::topup_failed(order.amount),
        };

        self.notify_both(
            &order.identity,
            driver_text,
            messages::operator_event(
                status.as_str(),
                &order.order_id,
                &event.payment_ref,
                &order.identity,
                order.amount,
                None,
            ),
        )
        .await;

        Ok(())
    }

    /// Balance mutation failed after the gateway confirmed payment. The
    /// order stays live and retryable; the money must not be silently
    /// dropped, so the operator gets an alert instead of the driver a
    /// success message.
    async fn hold_order_open(
        &self,
        order: &Order,
        event: &GatewayEvent,
        detail: &str,
    ) -> Result<(), ReconcileError> {
        error!(
            order_id = %order.order_id,
            identity = %order.identity,
            detail,
            "balance update failed after payment success; holding order open"
        );

        self.notify_operator(messages::operator_event(
            "error",
            &order.order_id,
            &event.payment_ref,
            &order.identity,
            order.amount,
            Some(&format!("balance update failed: {}", detail)),
        ))
        .await;

        Err(ReconcileError::DirectoryWriteFailure(detail.to_string()))
    }

    async fn directory_lookup(
        &self,
        identity: &str,
    ) -> Result<Option<crate::domain::driver::DriverRecord>, DirectoryError> {
        tokio::time::timeout(self.directory_timeout, self.directory.lookup(identity))
            .await
            .map_err(|_| DirectoryError::Timeout)?
    }

    /// Notification failures are logged, never propagated: delivery to the
    /// chat transport is best effort.
    async fn notify_both(&self, identity: &str, driver_text: String, operator_text: String) {
        let driver = self.notifier.send_to_driver(identity, &driver_text);
        let operator = self.notifier.send_to_operator(&operator_text);
        let (driver_result, operator_result) = futures::future::join(driver, operator).await;

        if let Err(err) = driver_result {
            warn!(identity, %err, "driver notification failed");
        }
        if let Err(err) = operator_result {
            warn!(%err, "operator notification failed");
        }
    }

    async fn notify_operator(&self, text: String) {
        if let Err(err) = self.notifier.send_to_operator(&text).await {
            warn!(%err, "operator notification failed");
        }
    }

    pub fn pending_count(&self) -> usize {
        self.table.live_count()
    }

    pub fn pending_order(&self, order_id: &str) -> Option<Order> {
        self.table.get(order_id)
    }

    pub fn pending_order_for(&self, identity: &str) -> Option<Order> {
        self.table.find_by_identity(identity)
    }

    pub fn audit_entries(&self) -> Vec<TransactionRecord> {
        self.audit.entries()
    }
}
