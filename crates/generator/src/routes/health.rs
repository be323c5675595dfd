use crate::state::GeneratorState;
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

static START_TIME: once_cell::sync::Lazy<SystemTime> = once_cell::sync::Lazy::new(SystemTime::now);

fn uptime_seconds() -> u64 {
    START_TIME.elapsed().map(|d| d.as_secs()).unwrap_or(0)
}

/// Liveness
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "seedline-generator",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
    }))
}

/// Readiness. Reports the configured backend; it does not probe it, so the
/// generator can start before the server does.
pub async fn readiness_check(State(state): State<Arc<GeneratorState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ready",
        "service": "seedline-generator",
        "backend": state.client.base_url(),
        "stagnation_limit": state.config.retry.stagnation_limit,
    }))
}
