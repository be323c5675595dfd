//! API route handlers
//!
//! - `health`: liveness and readiness
//! - `generate`: customer and transaction generation

pub mod generate;
pub mod health;

use crate::error::GeneratorError;
use axum::Json;
use axum::response::IntoResponse;
use serde_json::json;

/// API version and base info
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": "Seedline Generator",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /generate/customer?num=",
            "POST /generate/transactions?transactions_num=&customers_num=",
            "/health",
            "/ready"
        ]
    }))
}

/// 404 Not Found handler
pub async fn not_found() -> GeneratorError {
    GeneratorError::NotFound
}
