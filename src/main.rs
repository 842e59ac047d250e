use anyhow::Result;
use axum::{routing::get, Router};
use gas_oracle::{
    config::Config,
    handlers::{calculate_gas_fee, health_check, AppState, HealthState},
    services::{EthereumService, GasFeeService},
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting gas-oracle v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {:?}", config.environment);

    // Initialize services
    let ethereum = Arc::new(EthereumService::new(&config).await?);
    let gas = Arc::new(GasFeeService::new(
        ethereum.clone(),
        Duration::from_secs(config.cache_ttl_seconds),
    ));

    let app_state = AppState { gas };
    let health_state = HealthState {
        ethereum,
        started_at: Instant::now(),
    };

    // Build router; the two endpoints carry different state types
    let fee_routes = Router::new()
        .route("/", get(calculate_gas_fee))
        .with_state(app_state);
    let health_routes = Router::new()
        .route("/health", get(health_check))
        .with_state(health_state);

    let app = fee_routes
        .merge(health_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl+c");
    tracing::info!("Shutting down gracefully...");
}
