//! API error types and responses.
//!
//! This module defines the standard error format for the REST surface.
//! WebSocket-side failures never pass through here; the routing engine
//! reports those as `error` frames on the offending connection.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use quayside_routing::ChatError;
use quayside_store::StoreError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with the current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The requester is not entitled to perform this action.
    #[error("forbidden")]
    Forbidden,

    /// Invalid request body or parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Error details.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Forbidden => "forbidden",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::SessionNotFound(id) => Self::NotFound(format!("session {id}")),
            ChatError::SessionClosed(id) => Self::Conflict(format!("session {id} is closed")),
            ChatError::AlreadyAssigned(id) => {
                Self::Conflict(format!("session {id} is already assigned"))
            }
            ChatError::NotSessionAgent(_) => Self::Forbidden,
            ChatError::EmptyMessage => Self::BadRequest("message text must not be empty".into()),
            ChatError::UnknownConnection(id) => {
                Self::BadRequest(format!("unknown connection {id}"))
            }
            ChatError::Store(store_err) => Self::from(store_err),
            ChatError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                Self::Internal(msg)
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound("resource".into()),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Database(_) | StoreError::Serialization(_) => {
                tracing::error!(error = %err, "Store error");
                Self::Internal("storage error".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quayside_core::SessionId;

    #[test]
    fn error_status_codes() {
        assert_eq!(
            ApiError::NotFound("test".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("test".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::BadRequest("test".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("test".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn chat_error_mapping() {
        let session_id = SessionId::generate();
        assert_eq!(
            ApiError::from(ChatError::SessionNotFound(session_id)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ChatError::SessionClosed(session_id)).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(ChatError::NotSessionAgent(session_id)).code(),
            "forbidden"
        );
    }
}
