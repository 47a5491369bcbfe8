use crate::directory::{DirectoryError, DriverDirectory};
use crate::domain::driver::DriverRecord;
use async_trait::async_trait;
use failsafe::futures::CircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct BalanceUpdate {
    balance: i64,
}

/// HTTP client for the spreadsheet-bridge directory service.
pub struct SheetDirectoryClient {
    client: Client,
    base_url: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>,
}

impl SheetDirectoryClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self::with_circuit_breaker_config(base_url, timeout, 5, Duration::from_secs(60))
    }

    pub fn with_circuit_breaker_config(
        base_url: String,
        timeout: Duration,
        failure_threshold: u32,
        reset_timeout: Duration,
    ) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_default();

        let backoff = backoff::exponential(Duration::from_secs(10), reset_timeout);
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        SheetDirectoryClient {
            client,
            base_url,
            circuit_breaker,
        }
    }

    fn driver_url(&self, identity: &str) -> String {
        format!("{}/drivers/{}", self.base_url.trim_end_matches('/'), identity)
    }

    fn map_error(err: FailsafeError<DirectoryError>) -> DirectoryError {
        match err {
            FailsafeError::Rejected => DirectoryError::CircuitOpen,
            FailsafeError::Inner(DirectoryError::Request(inner)) if inner.is_timeout() => {
                DirectoryError::Timeout
            }
            FailsafeError::Inner(e) => e,
        }
    }
}

#[async_trait]
impl DriverDirectory for SheetDirectoryClient {
    async fn lookup(&self, identity: &str) -> Result<Option<DriverRecord>, DirectoryError> {
        let url = self.driver_url(identity);
        let client = self.client.clone();

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client.get(&url).send().await?;

                if response.status() == StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if !response.status().is_success() {
                    return Err(DirectoryError::Unavailable(response.status().to_string()));
                }

                let record = response.json::<DriverRecord>().await?;
                Ok(Some(record))
            })
            .await;

        result.map_err(Self::map_error)
    }

    async fn update_balance(&self, identity: &str, new_balance: i64) -> Result<(), DirectoryError> {
        let url = format!("{}/balance", self.driver_url(identity));
        let client = self.client.clone();

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .put(&url)
                    .json(&BalanceUpdate {
                        balance: new_balance,
                    })
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let detail = response.text().await.unwrap_or_default();
                    return Err(DirectoryError::WriteRejected(format!(
                        "{}: {}",
                        status, detail
                    )));
                }
                Ok(())
            })
            .await;

        result.map_err(Self::map_error)
    }
}

impl Clone for SheetDirectoryClient {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            circuit_breaker: self.circuit_breaker.clone(),
        }
    }
}
