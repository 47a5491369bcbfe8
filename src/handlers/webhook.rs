//! Gateway callback endpoint.
//!
//! Only authentication and payload shape decide the HTTP status: a verified,
//! well-formed callback is acknowledged with 200 whatever the business
//! outcome, so the gateway's retry policy keys off transport problems only.

use crate::error::AppError;
use crate::gateway::webhook::{WebhookError, SIGNATURE_HEADER};
use crate::services::orchestrator::ReconcileError;
use crate::AppState;
use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct CallbackAck {
    pub success: bool,
    pub message: String,
}

fn ack(message: &str) -> Response {
    (
        StatusCode::OK,
        Json(CallbackAck {
            success: true,
            message: message.to_string(),
        }),
    )
        .into_response()
}

pub async fn payment_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = match headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) {
        Some(signature) => signature,
        None => return AppError::Unauthorized("missing callback signature".to_string()).into_response(),
    };

    let event = match state.verifier.parse(&body, signature) {
        Ok(event) => event,
        Err(WebhookError::InvalidSignature) => {
            return AppError::Unauthorized("invalid callback signature".to_string()).into_response()
        }
        Err(WebhookError::MalformedPayload(detail)) => {
            return AppError::BadRequest(detail).into_response()
        }
    };

    tracing::info!(order_id = %event.order_id, event = event.kind.as_str(), "callback received");

    match state.orchestrator.apply_gateway_event(event).await {
        Ok(()) => ack("callback processed"),
        // Idempotent no-ops: the order was never ours or already finished.
        Err(ReconcileError::OrderNotFound) => ack("no matching order"),
        Err(ReconcileError::AlreadyFinalized) => ack("order already finalized"),
        // Operator was alerted and the order is held open; the payload
        // itself was fine, so still acknowledge.
        Err(ReconcileError::DirectoryWriteFailure(_)) => ack("callback accepted; credit deferred"),
        Err(ReconcileError::BalanceOverflow) => ack("callback accepted; credit deferred"),
    }
}

/// Development-only callback injector: takes an unsigned payload, signs it
/// with the configured secret and pushes it through the real verification
/// path. Returns 404 outside the development profile.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TestCallback {
    pub order_id: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub transaction_status: String,
    pub gross_amount: i64,
}

pub async fn test_callback(
    State(state): State<AppState>,
    Json(payload): Json<TestCallback>,
) -> Response {
    if !state.enable_test_routes {
        return AppError::NotFound("not found".to_string()).into_response();
    }

    let body = serde_json::json!({
        "order_id": payload.order_id,
        "transaction_id": payload
            .transaction_id
            .unwrap_or_else(|| "test-transaction".to_string()),
        "transaction_status": payload.transaction_status,
        "gross_amount": payload.gross_amount,
    })
    .to_string();

    let signature = state.verifier.sign(body.as_bytes());

    let event = match state.verifier.parse(body.as_bytes(), &signature) {
        Ok(event) => event,
        Err(err) => return AppError::BadRequest(err.to_string()).into_response(),
    };

    match state.orchestrator.apply_gateway_event(event).await {
        Ok(()) => ack("test callback processed"),
        Err(err) => ack(&format!("test callback rejected: {}", err)),
    }
}
