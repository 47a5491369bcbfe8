use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use utoipa::ToSchema;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: HashMap<String, DependencyStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DependencyStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[async_trait]
pub trait DependencyChecker: Send + Sync {
    async fn check(&self) -> DependencyStatus;
    fn name(&self) -> &'static str;
}

/// Probes an HTTP collaborator by hitting its base URL. A response of any
/// status counts as reachable; only transport errors and timeouts are
/// unhealthy.
pub struct HttpChecker {
    name: &'static str,
    client: reqwest::Client,
    url: String,
}

impl HttpChecker {
    pub fn new(name: &'static str, url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { name, client, url }
    }
}

#[async_trait]
impl DependencyChecker for HttpChecker {
    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        let probe = self.client.get(&self.url).send();

        match timeout(PROBE_TIMEOUT, probe).await {
            Ok(Ok(_)) => DependencyStatus {
                status: "healthy".to_string(),
                latency_ms: Some(start.elapsed().as_millis() as u64),
                error: None,
            },
            Ok(Err(e)) => DependencyStatus {
                status: "unhealthy".to_string(),
                latency_ms: None,
                error: Some(e.to_string()),
            },
            Err(_) => DependencyStatus {
                status: "unhealthy".to_string(),
                latency_ms: None,
                error: Some("probe timed out".to_string()),
            },
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Aggregates dependency probes. All healthy -> healthy; some -> degraded;
/// none -> unhealthy.
pub async fn check_health(
    checkers: &[Box<dyn DependencyChecker>],
    start_time: Instant,
) -> HealthResponse {
    let mut dependencies = HashMap::new();
    let mut healthy = 0usize;

    for checker in checkers {
        let status = checker.check().await;
        if status.status == "healthy" {
            healthy += 1;
        }
        dependencies.insert(checker.name().to_string(), status);
    }

    let status = if healthy == checkers.len() {
        "healthy"
    } else if healthy > 0 {
        "degraded"
    } else {
        "unhealthy"
    };

    HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
        dependencies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reachable_dependency_is_healthy() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(200).create_async().await;

        let checker = HttpChecker::new("gateway", server.url());
        let status = checker.check().await;

        assert_eq!(status.status, "healthy");
        assert!(status.latency_ms.is_some());
    }

    #[tokio::test]
    async fn test_error_status_still_counts_as_reachable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(500).create_async().await;

        let checker = HttpChecker::new("directory", server.url());
        assert_eq!(checker.check().await.status, "healthy");
    }

    #[tokio::test]
    async fn test_unreachable_dependency_is_unhealthy() {
        // Nothing listens on port 9 (discard).
        let checker = HttpChecker::new("transport", "http://127.0.0.1:9".to_string());
        let status = checker.check().await;

        assert_eq!(status.status, "unhealthy");
        assert!(status.error.is_some());
    }

    #[tokio::test]
    async fn test_aggregate_degraded() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(200).create_async().await;

        let checkers: Vec<Box<dyn DependencyChecker>> = vec![
            Box::new(HttpChecker::new("up", server.url())),
            Box::new(HttpChecker::new("down", "http://127.0.0.1:9".to_string())),
        ];

        let response = check_health(&checkers, Instant::now()).await;
        assert_eq!(response.status, "degraded");
        assert_eq!(response.dependencies.len(), 2);
    }
}
