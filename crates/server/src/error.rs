use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use opspulse_core::QuarantineReason;
use opspulse_ingest::QueueFullError;
use opspulse_state::StateError;
use thiserror::Error;

/// Errors surfaced by the pulse server's HTTP handlers.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A message failed one of the synchronous precheck steps (spec.md §4.3
    /// steps 2-4) and was rejected before it ever reached the queue.
    #[error("rejected: {0:?}")]
    Rejected(QuarantineReason),

    /// The ingest queue is at capacity (spec.md §5's backpressure contract).
    /// Distinct from a per-device rate-limit rejection, which is folded into
    /// `Rejected` via `QuarantineReason::RateLimited` (see DESIGN.md).
    #[error("queue full")]
    QueueFull,

    #[error("not found")]
    NotFound,

    #[error("backend error: {0}")]
    Backend(#[from] StateError),
}

impl From<QueueFullError> for ServerError {
    fn from(_: QueueFullError) -> Self {
        Self::QueueFull
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message, retry_after) = match &self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), None),
            Self::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None),
            Self::NotFound => (StatusCode::NOT_FOUND, "not found".to_owned(), None),
            Self::Backend(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None),
            Self::Rejected(reason) => {
                let status = match reason {
                    QuarantineReason::UnregisteredDevice
                    | QuarantineReason::InvalidToken
                    | QuarantineReason::DeviceRevoked => StatusCode::UNAUTHORIZED,
                    QuarantineReason::SiteMismatch => StatusCode::FORBIDDEN,
                    QuarantineReason::Malformed => StatusCode::BAD_REQUEST,
                    QuarantineReason::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                };
                (status, format!("{reason:?}"), None)
            }
            Self::QueueFull => (
                StatusCode::TOO_MANY_REQUESTS,
                "ingest queue is at capacity".to_owned(),
                Some(1),
            ),
        };

        let body = if let Some(retry) = retry_after {
            serde_json::json!({ "error": message, "retry_after": retry })
        } else {
            serde_json::json!({ "error": message })
        };

        let mut response = (status, axum::Json(body)).into_response();

        if let Some(retry) = retry_after {
            response
                .headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        response
    }
}
