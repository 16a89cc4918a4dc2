//! Error types for the routing engine.
//!
//! Every variant here is recovered at the engine boundary: it is reported
//! back to the offending connection as an `error` frame and never tears the
//! connection down or bubbles up as a fatal error.

use quayside_core::{ConnectionId, SessionId};
use thiserror::Error;

/// A result type using `ChatError`.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors that can occur while routing chat events.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The referenced session does not exist.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The referenced session is closed; no further actions apply.
    #[error("session is closed: {0}")]
    SessionClosed(SessionId),

    /// Another agent already took the session (take race loser).
    #[error("session already assigned: {0}")]
    AlreadyAssigned(SessionId),

    /// The requester is not entitled to act on this session
    /// (e.g. an agent messaging a session it has not taken).
    #[error("requester is not the session's agent: {0}")]
    NotSessionAgent(SessionId),

    /// A user or agent message with an empty body.
    #[error("message text must not be empty")]
    EmptyMessage,

    /// The connection has no registered identity for this action.
    #[error("unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] quayside_store::StoreError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Stable error kind string, carried on outbound `error` frames.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "session_not_found",
            Self::SessionClosed(_) => "session_closed",
            Self::AlreadyAssigned(_) => "already_assigned",
            Self::NotSessionAgent(_) => "not_session_agent",
            Self::EmptyMessage => "empty_message",
            Self::UnknownConnection(_) => "unknown_connection",
            Self::Store(_) => "storage_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Returns true if this error might be resolved by retrying.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        let session_id = SessionId::generate();
        assert_eq!(
            ChatError::SessionNotFound(session_id).kind(),
            "session_not_found"
        );
        assert_eq!(
            ChatError::SessionClosed(session_id).kind(),
            "session_closed"
        );
        assert_eq!(
            ChatError::AlreadyAssigned(session_id).kind(),
            "already_assigned"
        );
        assert_eq!(ChatError::EmptyMessage.kind(), "empty_message");
    }

    #[test]
    fn retriable_classification() {
        let session_id = SessionId::generate();
        assert!(!ChatError::SessionNotFound(session_id).is_retriable());
        assert!(ChatError::Internal("boom".into()).is_retriable());
    }
}
