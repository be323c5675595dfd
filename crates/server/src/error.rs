use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use seedline::{ConfigError, PipelineError, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Pipeline(
                PipelineError::BatchTooLarge { .. }
                | PipelineError::InvalidInput(_)
                | PipelineError::EmptyCustomerPool,
            ) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_)
            | ServerError::Store(_)
            | ServerError::Internal(_)
            | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::Pipeline(PipelineError::BatchTooLarge { .. }) => "BATCH_TOO_LARGE",
            ServerError::Pipeline(PipelineError::Persistence { .. }) => "PERSISTENCE_FAILED",
            ServerError::Pipeline(_) => "PIPELINE_ERROR",
            ServerError::Store(_) => "STORAGE_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }

    /// Extra structured context. A failed bulk insert still reports the
    /// counts it reconciled.
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ServerError::Pipeline(PipelineError::Persistence { result, .. }) => {
                serde_json::to_value(result).ok()
            }
            ServerError::Pipeline(PipelineError::BatchTooLarge { len, max }) => {
                Some(json!({ "len": len, "max": max }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ConfigError> for ServerError {
    fn from(err: ConfigError) -> Self {
        ServerError::Config(err.to_string())
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Config(format!("Invalid address: {err}"))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedline::BatchResult;

    #[test]
    fn batch_limit_is_a_client_error() {
        let err = ServerError::from(PipelineError::BatchTooLarge { len: 2001, max: 2000 });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "BATCH_TOO_LARGE");
    }

    #[test]
    fn persistence_failure_carries_counts() {
        let err = ServerError::from(PipelineError::Persistence {
            result: BatchResult::new(5, 3),
            source: StoreError::backend("disk full"),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let details = err.details().unwrap();
        assert_eq!(details["successCount"], 5);
        assert_eq!(details["failCount"], 3);
    }
}
