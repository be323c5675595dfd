//! API route handlers
//!
//! - `health`: liveness, readiness, metrics and metadata
//! - `customers`: bulk customer ingestion, listings and reset
//! - `transactions`: bulk transaction ingestion and date-range queries

pub mod customers;
pub mod health;
pub mod transactions;

use crate::error::ServerError;
use axum::Json;
use axum::response::IntoResponse;
use serde_json::json;

/// API version and base info
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": "Seedline Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /customers/multi",
            "GET /customers",
            "GET /customers/limit/{num}",
            "DELETE /customers/reset",
            "POST /transactions/multi",
            "GET /customers/{id}/transactions/date",
            "/health",
            "/ready",
            "/metrics"
        ]
    }))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
