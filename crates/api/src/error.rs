use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use stash_core::SourceError;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The event source rejected or could not decode the delivery.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The task submitting a batch to the pool died before finishing.
    #[error("dispatch task failed: {0}")]
    Dispatch(#[from] tokio::task::JoinError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Source(SourceError::InvalidSignature) => {
                tracing::warn!("Rejected webhook with invalid signature");
                (
                    StatusCode::BAD_REQUEST,
                    "INVALID_SIGNATURE",
                    self.to_string(),
                )
            }
            AppError::Source(err) => {
                tracing::error!(error = %err, "Failed to parse webhook");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Dispatch(err) => {
                tracing::error!(error = %err, "Webhook dispatch aborted");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
