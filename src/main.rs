mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use topup_core::commands::CommandRouter;
use topup_core::config::profiles::Profile;
use topup_core::config::Config;
use topup_core::directory::SheetDirectoryClient;
use topup_core::gateway::{SnapApiClient, WebhookVerifier};
use topup_core::services::{sweeper, KeyedLock, Orchestrator, RateLimiter};
use topup_core::transport::ChatTransportClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

/// OpenAPI schema for the top-up service API
#[derive(OpenApi)]
#[openapi(
    components(
        schemas(
            topup_core::health::HealthResponse,
            topup_core::health::DependencyStatus,
            topup_core::handlers::StatusResponse,
            topup_core::handlers::message::InboundMessage,
            topup_core::handlers::message::MessageReply,
            topup_core::handlers::webhook::CallbackAck,
            topup_core::handlers::webhook::TestCallback,
        )
    ),
    info(
        title = "Top-Up Core API",
        version = "0.1.0",
        description = "Driver balance top-up orchestration over chat commands and payment callbacks",
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Callbacks", description = "Payment gateway callbacks"),
    )
)]
pub struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_info = Config::from_env()?;
    let config = config_info.config;
    let profile = config_info.profile;

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Some(Commands::Config) => {
            println!("profile: {}", profile.as_str());
            println!("server_port: {}", config.server_port);
            println!("gateway_base_url: {}", config.gateway_base_url);
            println!("directory_base_url: {}", config.directory_base_url);
            println!("transport_base_url: {}", config.transport_base_url);
            println!(
                "operator_phone: {}",
                config.operator_phone.as_deref().unwrap_or("(unset)")
            );
            if config_info.overrides.is_empty() {
                println!("overrides: (none)");
            } else {
                println!("overrides: {}", config_info.overrides.join(", "));
            }
            return Ok(());
        }
        Some(Commands::Serve) | None => {}
    }

    let gateway = Arc::new(SnapApiClient::new(
        config.gateway_base_url.clone(),
        config.gateway_server_key.clone(),
        Duration::from_secs(config.gateway_timeout_secs),
    ));
    let directory = Arc::new(SheetDirectoryClient::new(
        config.directory_base_url.clone(),
        Duration::from_secs(config.directory_timeout_secs),
    ));
    let notifier = Arc::new(ChatTransportClient::new(
        config.transport_base_url.clone(),
        config.operator_phone.clone(),
    ));

    let rate_limiter = Arc::new(RateLimiter::default());
    let locks = Arc::new(KeyedLock::new());

    let orchestrator = Arc::new(Orchestrator::new(
        directory.clone(),
        gateway,
        notifier,
        rate_limiter.clone(),
        locks.clone(),
        Duration::from_secs(config.gateway_timeout_secs),
        Duration::from_secs(config.directory_timeout_secs),
    ));

    let command_router = Arc::new(CommandRouter::new(orchestrator.clone(), directory));

    let app_state = topup_core::AppState {
        orchestrator,
        command_router,
        verifier: WebhookVerifier::new(&config.webhook_secret),
        gateway_base_url: config.gateway_base_url.clone(),
        directory_base_url: config.directory_base_url.clone(),
        transport_base_url: config.transport_base_url.clone(),
        cors_allowed_origins: config.cors_allowed_origins.clone(),
        profile: profile.as_str().to_string(),
        enable_test_routes: profile != Profile::Production,
        start_time: std::time::Instant::now(),
    };

    // Bound the rate-limit and lock maps for the process lifetime.
    tokio::spawn(sweeper::run_sweeper(rate_limiter, locks));

    let app = topup_core::create_app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!(profile = profile.as_str(), "listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
