use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use seedline::{BatchResult, ConfigError, PipelineError, RetryError, TransportError};
use serde_json::json;

pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Generator error types
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Retry(#[from] RetryError),

    #[error("Backend error: {0}")]
    Transport(#[from] TransportError),

    /// A batched send failed after earlier batches were accepted.
    #[error("Backend error after {sent}: {source}")]
    PartialSend {
        sent: BatchResult,
        #[source]
        source: TransportError,
    },

    #[error("Generation error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

impl GeneratorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GeneratorError::BadRequest(_)
            | GeneratorError::Retry(RetryError::InvalidCount)
            | GeneratorError::Pipeline(
                PipelineError::EmptyCustomerPool | PipelineError::InvalidInput(_),
            ) => StatusCode::BAD_REQUEST,
            GeneratorError::Retry(RetryError::Transport { .. } | RetryError::Protocol { .. })
            | GeneratorError::Transport(_)
            | GeneratorError::PartialSend { .. } => StatusCode::BAD_GATEWAY,
            GeneratorError::NotFound => StatusCode::NOT_FOUND,
            GeneratorError::Retry(RetryError::PersistentFailure { .. })
            | GeneratorError::Pipeline(_)
            | GeneratorError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            GeneratorError::BadRequest(_) | GeneratorError::Retry(RetryError::InvalidCount) => {
                "BAD_REQUEST"
            }
            GeneratorError::Retry(RetryError::PersistentFailure { .. }) => "PERSISTENT_FAILURE",
            GeneratorError::Retry(RetryError::Protocol { .. }) => "PROTOCOL_ERROR",
            GeneratorError::Retry(RetryError::Transport { .. })
            | GeneratorError::Transport(_)
            | GeneratorError::PartialSend { .. } => "BACKEND_UNAVAILABLE",
            GeneratorError::Pipeline(PipelineError::EmptyCustomerPool) => "EMPTY_CUSTOMER_POOL",
            GeneratorError::Pipeline(_) => "GENERATION_ERROR",
            GeneratorError::Config(_) => "CONFIG_ERROR",
            GeneratorError::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for GeneratorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let mut body = json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        // Counts known so far go at the top level next to the error.
        match &self {
            GeneratorError::Retry(RetryError::PersistentFailure {
                failed,
                attempts,
                timings,
            }) => {
                body["failed"] = json!(failed);
                body["attempts"] = json!(attempts);
                body["generation_time"] = json!(format!("{:?}", timings.generate));
                body["send_time"] = json!(format!("{:?}", timings.send));
            }
            GeneratorError::Retry(RetryError::Transport {
                attempt,
                persisted,
                timings,
                ..
            }) => {
                body["persisted"] = json!(persisted);
                body["attempts"] = json!(attempt);
                body["generation_time"] = json!(format!("{:?}", timings.generate));
                body["send_time"] = json!(format!("{:?}", timings.send));
            }
            GeneratorError::PartialSend { sent, .. } => {
                body["successCount"] = json!(sent.success_count);
                body["failCount"] = json!(sent.fail_count);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

impl From<ConfigError> for GeneratorError {
    fn from(err: ConfigError) -> Self {
        GeneratorError::Config(err.to_string())
    }
}
