use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use failsafe::futures::CircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("payment gateway rejected the request: {0}")]
    Api(String),
    #[error("payment gateway call timed out")]
    Timeout,
    #[error("circuit breaker open - payment gateway unavailable")]
    CircuitOpen,
}

/// What `create_payment` needs from the caller: the order and the customer
/// snapshot the gateway displays on the payment page.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub order_id: String,
    pub amount: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub description: String,
}

/// Payable reference returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentHandle {
    pub payment_ref: String,
    pub payment_url: String,
    pub qr_code: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentHandle, GatewayError>;
}

/// Response from the Snap charge endpoint.
#[derive(Debug, Deserialize)]
struct ChargeResponse {
    token: String,
    redirect_url: String,
    #[serde(default)]
    qr_url: Option<String>,
    #[serde(default)]
    expiry_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct ChargeRequest<'a> {
    transaction_details: TransactionDetails<'a>,
    customer_details: CustomerDetails<'a>,
    item_details: Vec<ItemDetails<'a>>,
}

#[derive(Debug, Serialize)]
struct TransactionDetails<'a> {
    order_id: &'a str,
    gross_amount: i64,
}

#[derive(Debug, Serialize)]
struct CustomerDetails<'a> {
    first_name: &'a str,
    phone: &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct ItemDetails<'a> {
    id: &'static str,
    price: i64,
    quantity: u32,
    name: &'a str,
}

/// HTTP client for the Snap-style payment API.
pub struct SnapApiClient {
    client: Client,
    base_url: String,
    server_key: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>,
}

impl SnapApiClient {
    pub fn new(base_url: String, server_key: String, timeout: Duration) -> Self {
        Self::with_circuit_breaker_config(base_url, server_key, timeout, 5, Duration::from_secs(60))
    }

    pub fn with_circuit_breaker_config(
        base_url: String,
        server_key: String,
        timeout: Duration,
        failure_threshold: u32,
        reset_timeout: Duration,
    ) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_default();

        let backoff = backoff::exponential(Duration::from_secs(10), reset_timeout);
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        SnapApiClient {
            client,
            base_url,
            server_key,
            circuit_breaker,
        }
    }

    fn charge_url(&self) -> String {
        format!("{}/snap/v1/transactions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl PaymentGateway for SnapApiClient {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentHandle, GatewayError> {
        let url = self.charge_url();
        let client = self.client.clone();
        let server_key = self.server_key.clone();

        let body = ChargeRequest {
            transaction_details: TransactionDetails {
                order_id: &request.order_id,
                gross_amount: request.amount,
            },
            customer_details: CustomerDetails {
                first_name: &request.customer_name,
                phone: &request.customer_phone,
                email: &request.customer_email,
            },
            item_details: vec![ItemDetails {
                id: "DRIVER_TOPUP",
                price: request.amount,
                quantity: 1,
                name: &request.description,
            }],
        };

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .post(&url)
                    .basic_auth(&server_key, Some(""))
                    .json(&body)
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let detail = response.text().await.unwrap_or_default();
                    return Err(GatewayError::Api(format!("{}: {}", status, detail)));
                }

                let charge = response.json::<ChargeResponse>().await?;
                Ok(PaymentHandle {
                    payment_ref: charge.token,
                    payment_url: charge.redirect_url,
                    qr_code: charge.qr_url,
                    expires_at: charge
                        .expiry_time
                        .unwrap_or_else(|| Utc::now() + ChronoDuration::hours(24)),
                })
            })
            .await;

        match result {
            Ok(handle) => Ok(handle),
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitOpen),
            Err(FailsafeError::Inner(GatewayError::Request(inner))) if inner.is_timeout() => {
                Err(GatewayError::Timeout)
            }
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

impl Clone for SnapApiClient {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            server_key: self.server_key.clone(),
            circuit_breaker: self.circuit_breaker.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PaymentRequest {
        PaymentRequest {
            order_id: "TOPUP_6281234567890_1700000000000_ab12cd34".to_string(),
            amount: 50_000,
            customer_name: "Budi".to_string(),
            customer_phone: "6281234567890".to_string(),
            customer_email: "budi@example.com".to_string(),
            description: "Driver top-up Budi".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_payment_success() {
        let mut server = mockito::Server::new_async().await;

        let mock_response = r#"{
            "token": "snap-token-abc123",
            "redirect_url": "https://app.sandbox.midtrans.com/snap/v2/vtweb/snap-token-abc123",
            "qr_url": "https://api.sandbox.midtrans.com/v2/qris/snap-token-abc123/qr-code",
            "expiry_time": "2026-01-02T00:00:00Z"
        }"#;

        let _mock = server
            .mock("POST", "/snap/v1/transactions")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(mock_response)
            .create_async()
            .await;

        let client = SnapApiClient::new(
            server.url(),
            "SB-Mid-server-test".to_string(),
            Duration::from_secs(5),
        );
        let handle = client.create_payment(&request()).await.unwrap();

        assert_eq!(handle.payment_ref, "snap-token-abc123");
        assert!(handle.payment_url.contains("snap-token-abc123"));
        assert!(handle.qr_code.is_some());
    }

    #[tokio::test]
    async fn test_create_payment_api_error() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/snap/v1/transactions")
            .with_status(401)
            .with_body(r#"{"error_messages":["unauthorized"]}"#)
            .create_async()
            .await;

        let client = SnapApiClient::new(
            server.url(),
            "SB-Mid-server-wrong".to_string(),
            Duration::from_secs(5),
        );
        let result = client.create_payment(&request()).await;

        assert!(matches!(result, Err(GatewayError::Api(_))));
    }

    #[tokio::test]
    async fn test_create_payment_missing_expiry_gets_default() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/snap/v1/transactions")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token":"t","redirect_url":"https://pay.example/t"}"#)
            .create_async()
            .await;

        let client = SnapApiClient::new(
            server.url(),
            "SB-Mid-server-test".to_string(),
            Duration::from_secs(5),
        );
        let handle = client.create_payment(&request()).await.unwrap();
        assert!(handle.expires_at > Utc::now());
    }
}
