//! Shared test doubles and fixtures.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use topup_core::directory::{DirectoryError, DriverDirectory, InMemoryDirectory};
use topup_core::domain::driver::DriverRecord;
use topup_core::gateway::{
    GatewayError, GatewayEvent, GatewayEventKind, PaymentGateway, PaymentHandle, PaymentRequest,
};
use topup_core::services::{KeyedLock, Orchestrator, RateLimiter};
use topup_core::transport::{Notifier, TransportError};

pub const DRIVER_PHONE: &str = "6281234567890";

pub fn driver_record(phone: &str, balance: i64) -> DriverRecord {
    DriverRecord {
        id: format!("DRV-{}", &phone[phone.len() - 4..]),
        name: "Budi".to_string(),
        phone: phone.to_string(),
        email: Some("budi@example.com".to_string()),
        balance,
        status: "active".to_string(),
        rating: Some(9),
    }
}

/// Gateway double that always issues a payable reference.
pub struct StubGateway {
    pub calls: AtomicU32,
}

impl StubGateway {
    pub fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentHandle, GatewayError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentHandle {
            payment_ref: format!("snap-token-{}-{}", request.order_id, call),
            payment_url: format!("https://pay.example/{}", request.order_id),
            qr_code: Some(format!("https://pay.example/{}/qr", request.order_id)),
            expires_at: Utc::now() + ChronoDuration::hours(24),
        })
    }
}

/// Gateway double that always fails, for the no-partial-state path.
pub struct FailingGateway;

#[async_trait]
impl PaymentGateway for FailingGateway {
    async fn create_payment(&self, _request: &PaymentRequest) -> Result<PaymentHandle, GatewayError> {
        Err(GatewayError::Api("503 Service Unavailable".to_string()))
    }
}

/// Directory wrapper whose balance writes can be switched off mid-test.
pub struct ToggleWriteDirectory {
    inner: Arc<InMemoryDirectory>,
    fail_writes: AtomicBool,
}

impl ToggleWriteDirectory {
    pub fn new(inner: Arc<InMemoryDirectory>) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DriverDirectory for ToggleWriteDirectory {
    async fn lookup(&self, identity: &str) -> Result<Option<DriverRecord>, DirectoryError> {
        self.inner.lookup(identity).await
    }

    async fn update_balance(&self, identity: &str, new_balance: i64) -> Result<(), DirectoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DirectoryError::WriteRejected("sheet row locked".to_string()));
        }
        self.inner.update_balance(identity, new_balance).await
    }
}

/// Captures every outbound notification instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    pub driver_messages: Mutex<Vec<(String, String)>>,
    pub operator_messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn driver_messages(&self) -> Vec<(String, String)> {
        self.driver_messages.lock().unwrap().clone()
    }

    pub fn operator_messages(&self) -> Vec<String> {
        self.operator_messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_to_driver(&self, identity: &str, text: &str) -> Result<(), TransportError> {
        self.driver_messages
            .lock()
            .unwrap()
            .push((identity.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_to_operator(&self, text: &str) -> Result<(), TransportError> {
        self.operator_messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub orchestrator: Arc<Orchestrator>,
    pub directory: Arc<InMemoryDirectory>,
    pub toggle: Arc<ToggleWriteDirectory>,
    pub notifier: Arc<RecordingNotifier>,
}

/// Orchestrator wired to in-memory collaborators and a stub gateway.
pub fn harness() -> Harness {
    harness_with_gateway(Arc::new(StubGateway::new()))
}

pub fn harness_with_gateway(gateway: Arc<dyn PaymentGateway>) -> Harness {
    let directory = Arc::new(InMemoryDirectory::with_records([driver_record(
        DRIVER_PHONE,
        100_000,
    )]));
    let toggle = Arc::new(ToggleWriteDirectory::new(directory.clone()));
    let notifier = Arc::new(RecordingNotifier::new());

    let orchestrator = Arc::new(Orchestrator::new(
        toggle.clone(),
        gateway,
        notifier.clone(),
        Arc::new(RateLimiter::default()),
        Arc::new(KeyedLock::new()),
        Duration::from_secs(5),
        Duration::from_secs(5),
    ));

    Harness {
        orchestrator,
        directory,
        toggle,
        notifier,
    }
}

pub const TEST_WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Full router over the harness, the way `main` wires it.
pub fn test_app(h: &Harness, enable_test_routes: bool) -> axum::Router {
    let command_router = Arc::new(topup_core::commands::CommandRouter::new(
        h.orchestrator.clone(),
        h.toggle.clone(),
    ));

    topup_core::create_app(topup_core::AppState {
        orchestrator: h.orchestrator.clone(),
        command_router,
        verifier: topup_core::gateway::WebhookVerifier::new(TEST_WEBHOOK_SECRET),
        gateway_base_url: "http://127.0.0.1:9".to_string(),
        directory_base_url: "http://127.0.0.1:9".to_string(),
        transport_base_url: "http://127.0.0.1:9".to_string(),
        cors_allowed_origins: None,
        profile: "development".to_string(),
        enable_test_routes,
        start_time: std::time::Instant::now(),
    })
}

pub fn signed_callback_body(order_id: &str, status: &str, amount: i64) -> (String, String) {
    let body = serde_json::json!({
        "order_id": order_id,
        "transaction_id": "txn-test-1",
        "transaction_status": status,
        "gross_amount": amount,
    })
    .to_string();
    let signature =
        topup_core::gateway::WebhookVerifier::new(TEST_WEBHOOK_SECRET).sign(body.as_bytes());
    (body, signature)
}

pub fn success_event(order_id: &str, amount: i64) -> GatewayEvent {
    GatewayEvent {
        order_id: order_id.to_string(),
        payment_ref: "txn-test-1".to_string(),
        kind: GatewayEventKind::Success { amount },
    }
}

pub fn event(order_id: &str, kind: GatewayEventKind) -> GatewayEvent {
    GatewayEvent {
        order_id: order_id.to_string(),
        payment_ref: "txn-test-1".to_string(),
        kind,
    }
}
