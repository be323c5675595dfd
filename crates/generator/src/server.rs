//! Router and serve loop for the generator service.

use crate::config::GeneratorConfig;
use crate::routes::{api_info, generate, health, not_found};
use crate::state::GeneratorState;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the generator router.
///
/// The request timeout wraps the whole retry loop: when it fires, the loop
/// future is dropped along with any in-flight backend call and the caller
/// gets `504`, since the time went to the backend.
pub fn build_router(state: Arc<GeneratorState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/generate/customer", post(generate::generate_customers))
        .route("/generate/transactions", post(generate::generate_transactions))
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            state.config.request_timeout(),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the generator HTTP service and serve until Ctrl+C.
pub async fn start_server(config: GeneratorConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .json()
        .init();

    let state = Arc::new(GeneratorState::new(config.clone())?);
    let app = build_router(state);
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        %addr,
        backend = config.backend_url(),
        stagnation_limit = config.retry.stagnation_limit,
        "Starting seedline generator"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
            tracing::info!("Received Ctrl+C, shutting down...");
        })
        .await?;

    Ok(())
}
