//! Gateway status callback: signature verification and event decoding.
//!
//! Nothing from an unverified payload reaches the orchestrator. The gateway
//! signs the raw request body with HMAC-SHA256; the hex digest travels in
//! the `x-callback-signature` header.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-callback-signature";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WebhookError {
    #[error("callback signature verification failed")]
    InvalidSignature,
    #[error("malformed callback payload: {0}")]
    MalformedPayload(String),
}

/// Decoded, authenticated gateway notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEvent {
    pub order_id: String,
    pub payment_ref: String,
    pub kind: GatewayEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEventKind {
    Success { amount: i64 },
    Pending,
    Expired,
    Failed,
    Cancelled,
}

impl GatewayEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayEventKind::Success { .. } => "success",
            GatewayEventKind::Pending => "pending",
            GatewayEventKind::Expired => "expired",
            GatewayEventKind::Failed => "failed",
            GatewayEventKind::Cancelled => "cancelled",
        }
    }
}

/// Wire shape of the callback body.
#[derive(Debug, Deserialize)]
struct CallbackPayload {
    order_id: String,
    transaction_id: String,
    transaction_status: String,
    gross_amount: i64,
    #[serde(default)]
    fraud_status: Option<String>,
}

#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Vec<u8>,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Verifies the signature over the raw body, then decodes the payload
    /// into a `GatewayEvent`. Order matters: an attacker-controlled body is
    /// never parsed.
    pub fn parse(&self, raw_body: &[u8], signature_hex: &str) -> Result<GatewayEvent, WebhookError> {
        self.verify(raw_body, signature_hex)?;

        let payload: CallbackPayload = serde_json::from_slice(raw_body)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;
        decode_event(payload)
    }

    fn verify(&self, raw_body: &[u8], signature_hex: &str) -> Result<(), WebhookError> {
        let signature =
            hex::decode(signature_hex.trim()).map_err(|_| WebhookError::InvalidSignature)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| WebhookError::InvalidSignature)?;
        mac.update(raw_body);
        // Constant-time comparison.
        mac.verify_slice(&signature)
            .map_err(|_| WebhookError::InvalidSignature)
    }

    /// Signs a payload the way the gateway does. Used by the development
    /// test-callback path and the test suite.
    pub fn sign(&self, raw_body: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(raw_body);
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Maps the gateway's transaction/fraud status pair onto the event kinds the
/// orchestrator understands. `capture`/`settlement` only count as success
/// when fraud screening did not deny the charge.
fn decode_event(payload: CallbackPayload) -> Result<GatewayEvent, WebhookError> {
    if payload.gross_amount <= 0 {
        return Err(WebhookError::MalformedPayload(
            "gross_amount must be positive".to_string(),
        ));
    }

    let fraud_denied = payload.fraud_status.as_deref() == Some("deny");
    let kind = match payload.transaction_status.as_str() {
        "capture" | "settlement" if fraud_denied => GatewayEventKind::Failed,
        "capture" | "settlement" => GatewayEventKind::Success {
            amount: payload.gross_amount,
        },
        "pending" => GatewayEventKind::Pending,
        "expire" => GatewayEventKind::Expired,
        "deny" => GatewayEventKind::Failed,
        "cancel" => GatewayEventKind::Cancelled,
        other => {
            return Err(WebhookError::MalformedPayload(format!(
                "unknown transaction_status: {}",
                other
            )))
        }
    };

    Ok(GatewayEvent {
        order_id: payload.order_id,
        payment_ref: payload.transaction_id,
        kind,
    })
}
