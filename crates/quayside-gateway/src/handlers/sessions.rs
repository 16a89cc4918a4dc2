//! Session endpoints.
//!
//! The REST surface is read-only apart from the administrative close; all
//! conversational mutation happens over the WebSocket channel.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quayside_core::{AgentId, SessionId};
use quayside_routing::ChatRouter;
use quayside_store::{ChatSession, SessionStatus, Store};

use crate::error::ApiError;
use crate::protocol::WireMessage;
use crate::state::GatewayState;

// =============================================================================
// Response Types
// =============================================================================

/// Response for a session.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Session ID.
    pub session_id: String,
    /// Initiating user's display name.
    pub user_name: String,
    /// Initiating user's email.
    pub user_email: String,
    /// Current status.
    pub status: SessionStatus,
    /// Assigned agent, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    /// Assigned agent's display name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    /// Creation timestamp.
    pub started_at: DateTime<Utc>,
    /// When the session was closed (if closed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Most recent activity.
    pub last_message_at: DateTime<Utc>,
    /// Number of messages in the transcript.
    pub message_count: u64,
}

impl From<ChatSession> for SessionResponse {
    fn from(session: ChatSession) -> Self {
        Self {
            session_id: session.session_id.to_string(),
            user_name: session.user_name,
            user_email: session.user_email,
            status: session.status,
            agent_id: session.agent_id,
            agent_name: session.agent_name,
            started_at: session.started_at,
            closed_at: session.closed_at,
            last_message_at: session.last_message_at,
            message_count: session.message_count,
        }
    }
}

/// Response for listing sessions.
#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    /// List of sessions.
    pub sessions: Vec<SessionResponse>,
}

/// Response for a session transcript.
#[derive(Debug, Serialize)]
pub struct ListMessagesResponse {
    /// Messages in append order.
    pub messages: Vec<WireMessage>,
}

/// Query parameters for listing sessions.
#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    /// Optional status filter: `waiting`, `active`, or `closed`.
    pub status: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// List sessions, optionally filtered by status.
///
/// # Errors
///
/// Returns an error if the status filter is unknown or the store fails.
pub async fn list_sessions<R, S>(
    State(state): State<Arc<GatewayState<R, S>>>,
    Query(query): Query<ListSessionsQuery>,
) -> Result<impl IntoResponse, ApiError>
where
    R: ChatRouter + 'static,
    S: Store + 'static,
{
    let mut sessions = match query.status.as_deref() {
        None => state.store.list_all_sessions()?,
        Some(raw) => {
            let status = parse_status(raw)?;
            state.store.list_sessions_by_status(status)?
        }
    };

    // Open sessions first, most recent activity first within each group
    sessions.sort_by(|a, b| {
        b.is_open()
            .cmp(&a.is_open())
            .then_with(|| b.last_message_at.cmp(&a.last_message_at))
    });

    let response = ListSessionsResponse {
        sessions: sessions.into_iter().map(SessionResponse::from).collect(),
    };

    Ok(Json(response))
}

/// Get a session by ID.
///
/// # Errors
///
/// Returns an error if the session is not found.
pub async fn get_session<R, S>(
    State(state): State<Arc<GatewayState<R, S>>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    R: ChatRouter + 'static,
    S: Store + 'static,
{
    let session_id = parse_session_id(&session_id)?;

    let session = state
        .store
        .get_session(&session_id)?
        .ok_or_else(|| ApiError::NotFound(format!("session {session_id}")))?;

    Ok(Json(SessionResponse::from(session)))
}

/// Get a session's transcript in append order.
///
/// # Errors
///
/// Returns an error if the session is not found.
pub async fn list_messages<R, S>(
    State(state): State<Arc<GatewayState<R, S>>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    R: ChatRouter + 'static,
    S: Store + 'static,
{
    let session_id = parse_session_id(&session_id)?;

    if state.store.get_session(&session_id)?.is_none() {
        return Err(ApiError::NotFound(format!("session {session_id}")));
    }

    let messages = state.store.list_messages(&session_id)?;
    let response = ListMessagesResponse {
        messages: messages.into_iter().map(WireMessage::from).collect(),
    };

    Ok(Json(response))
}

/// Close a session administratively.
///
/// Bypasses the close policy; both connected parties are notified over
/// their channels exactly as on an agent-initiated close.
///
/// # Errors
///
/// Returns an error if the session is not found or already closed.
pub async fn close_session<R, S>(
    State(state): State<Arc<GatewayState<R, S>>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    R: ChatRouter + 'static,
    S: Store + 'static,
{
    let session_id = parse_session_id(&session_id)?;

    state.router.close_session_admin(session_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Helpers
// =============================================================================

/// Parse a session ID from a string.
fn parse_session_id(s: &str) -> Result<SessionId, ApiError> {
    s.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid session ID: {s}")))
}

/// Parse a status filter value.
fn parse_status(s: &str) -> Result<SessionStatus, ApiError> {
    match s {
        "waiting" => Ok(SessionStatus::Waiting),
        "active" => Ok(SessionStatus::Active),
        "closed" => Ok(SessionStatus::Closed),
        other => Err(ApiError::BadRequest(format!("unknown status: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_parses() {
        assert_eq!(parse_status("waiting").unwrap(), SessionStatus::Waiting);
        assert_eq!(parse_status("active").unwrap(), SessionStatus::Active);
        assert_eq!(parse_status("closed").unwrap(), SessionStatus::Closed);
        assert!(parse_status("open").is_err());
    }

    #[test]
    fn bad_session_id_rejected() {
        assert!(parse_session_id("not-a-uuid").is_err());
    }
}
