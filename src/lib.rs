pub mod commands;
pub mod config;
pub mod directory;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod services;
pub mod transport;
pub mod utils;

use crate::commands::CommandRouter;
use crate::gateway::WebhookVerifier;
use crate::services::Orchestrator;
use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub command_router: Arc<CommandRouter>,
    pub verifier: WebhookVerifier,
    pub gateway_base_url: String,
    pub directory_base_url: String,
    pub transport_base_url: String,
    pub cors_allowed_origins: Option<String>,
    pub profile: String,
    pub enable_test_routes: bool,
    pub start_time: std::time::Instant,
}

pub fn create_app(app_state: AppState) -> Router {
    let cors = match &app_state.cors_allowed_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            CorsLayer::new().allow_origin(AllowOrigin::list(origins))
        }
        None => CorsLayer::new(),
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/messages", post(handlers::message::inbound_message))
        .route("/callback/payment", post(handlers::webhook::payment_callback))
        .route("/callback/test", post(handlers::webhook::test_callback))
        .layer(axum::middleware::from_fn(
            middleware::request_logger_middleware,
        ))
        .layer(cors)
        .with_state(app_state)
}
