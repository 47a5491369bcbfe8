//! Outbound chat notifications, seen through the transport's HTTP API.

pub mod messages;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("chat transport rejected the message: {0}")]
    Rejected(String),
}

/// Sends messages to a driver or the operator. Delivery is best effort; the
/// transport offers no exactly-once guarantee and callers must not fail a
/// reconciliation because a notification bounced.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_to_driver(&self, identity: &str, text: &str) -> Result<(), TransportError>;
    async fn send_to_operator(&self, text: &str) -> Result<(), TransportError>;
}

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    to: &'a str,
    body: &'a str,
}

/// HTTP client for the chat-transport sidecar.
#[derive(Clone)]
pub struct ChatTransportClient {
    client: Client,
    base_url: String,
    operator_phone: Option<String>,
}

impl ChatTransportClient {
    pub fn new(base_url: String, operator_phone: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url,
            operator_phone,
        }
    }

    async fn send(&self, to: &str, body: &str) -> Result<(), TransportError> {
        let url = format!("{}/messages", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&OutboundMessage { to, body })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected(format!("{}: {}", status, detail)));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for ChatTransportClient {
    async fn send_to_driver(&self, identity: &str, text: &str) -> Result<(), TransportError> {
        self.send(identity, text).await
    }

    async fn send_to_operator(&self, text: &str) -> Result<(), TransportError> {
        // No operator configured means operator notifications are dropped on
        // purpose, matching an unset ADMIN contact.
        match &self.operator_phone {
            Some(phone) => self.send(phone, text).await,
            None => Ok(()),
        }
    }
}
