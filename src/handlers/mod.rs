pub mod message;
pub mod webhook;

use crate::health::{check_health, DependencyChecker, HttpChecker};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let checkers: Vec<Box<dyn DependencyChecker>> = vec![
        Box::new(HttpChecker::new("gateway", state.gateway_base_url.clone())),
        Box::new(HttpChecker::new("directory", state.directory_base_url.clone())),
        Box::new(HttpChecker::new("transport", state.transport_base_url.clone())),
    ];

    let health_response = check_health(&checkers, state.start_time).await;

    let status_code = match health_response.status.as_str() {
        "healthy" => StatusCode::OK,
        "degraded" => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health_response))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    pub profile: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub pending_orders: usize,
}

pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let response = StatusResponse {
        status: "running".to_string(),
        profile: state.profile.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        pending_orders: state.orchestrator.pending_count(),
    };
    (StatusCode::OK, Json(response))
}
