pub mod client;
pub mod webhook;

pub use client::{GatewayError, PaymentGateway, PaymentHandle, PaymentRequest, SnapApiClient};
pub use webhook::{GatewayEvent, GatewayEventKind, WebhookError, WebhookVerifier};
