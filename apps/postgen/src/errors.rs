use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Corpus source missing or malformed.
    #[error("Load error: {0}")]
    Load(String),

    /// Completion reply not in the expected structured shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No API key resolvable from any configured source.
    #[error("Credential error: {0}")]
    Credential(String),

    /// The completion call itself failed.
    #[error("Completion service error: {0}")]
    Service(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Credential(msg) => AppError::Credential(msg),
            other => AppError::Service(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Load(msg) => {
                tracing::error!("Corpus load error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "LOAD_ERROR",
                    format!("The example corpus could not be loaded: {msg}"),
                )
            }
            AppError::Parse(msg) => {
                tracing::error!("Parse error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PARSE_ERROR",
                    "The language model returned an unexpected response".to_string(),
                )
            }
            AppError::Credential(msg) => {
                tracing::error!("Credential error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "CREDENTIAL_ERROR",
                    msg.clone(),
                )
            }
            AppError::Service(msg) => {
                tracing::error!("Completion service error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SERVICE_ERROR",
                    "The language model call failed".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
