// HTTP error mapping
//
// Every mutating endpoint returns either a success body or a specific
// error body - no silent failures. The body names the error kind and
// whether re-triggering the action can help.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use siren_core::SirenError;

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable error kind, e.g. "location_unavailable"
    pub error: &'static str,
    /// Human-readable description
    pub message: String,
    /// Whether re-triggering the same action may succeed
    pub retryable: bool,
}

#[derive(Debug)]
pub struct ApiError(pub SirenError);

impl From<SirenError> for ApiError {
    fn from(err: SirenError) -> Self {
        ApiError(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(SirenError::store(err.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let err = self.0;
        let (status, kind) = match &err {
            SirenError::LocationUnavailable(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "location_unavailable")
            }
            SirenError::Summarizer(_) => (StatusCode::BAD_GATEWAY, "summarizer_failed"),
            SirenError::SummarizerTimeout(_) => {
                (StatusCode::GATEWAY_TIMEOUT, "summarizer_timeout")
            }
            SirenError::InvalidTransition { .. } => (StatusCode::CONFLICT, "invalid_transition"),
            SirenError::UnknownStatus(_) => (StatusCode::BAD_REQUEST, "unknown_status"),
            SirenError::AlertNotFound(_) => (StatusCode::NOT_FOUND, "alert_not_found"),
            SirenError::UserNotFound(_) => (StatusCode::NOT_FOUND, "user_not_found"),
            SirenError::NotificationClaimed(_) => (StatusCode::NOT_FOUND, "already_claimed"),
            SirenError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
        };

        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        } else {
            tracing::debug!(error = %err, "request rejected");
        }

        let body = ErrorBody {
            error: kind,
            message: err.to_string(),
            retryable: err.is_retryable(),
        };

        (status, Json(body)).into_response()
    }
}
