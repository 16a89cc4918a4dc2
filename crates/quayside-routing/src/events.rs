//! Typed event unions crossing the gateway/engine boundary.
//!
//! The wire protocol keeps the named-event style clients already speak
//! (`start_chat`, `agent_take_session`, ...). Inside the server those frames
//! are decoded into `InboundEvent` before they reach the routing engine, and
//! everything the engine pushes back out is an `OutboundEvent`. No stringly
//! event names exist on this boundary.

use quayside_core::{AgentId, SessionId, UserId};
use quayside_store::{ChatSession, Message, Sender, SessionStatus};
use serde::{Deserialize, Serialize};

/// End-user identity carried on `start_chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    /// User ID from the product's auth layer.
    pub user_id: UserId,
    /// Display name.
    pub user_name: String,
    /// Email address.
    pub user_email: String,
}

/// Agent identity carried on `agent_join` and `agent_take_session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentIdentity {
    /// Agent ID from the product's auth layer.
    pub agent_id: AgentId,
    /// Display name.
    pub agent_name: String,
}

/// Events flowing from a connection into the routing engine.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// A user opens (or resumes) a support conversation.
    StartChat(UserIdentity),
    /// An agent comes online and requests the queue view.
    AgentJoin(AgentIdentity),
    /// An agent claims a waiting session.
    TakeSession {
        /// Session being claimed.
        session_id: SessionId,
        /// Claiming agent.
        agent: AgentIdentity,
    },
    /// Either party posts a message.
    SendMessage {
        /// Owning session.
        session_id: SessionId,
        /// Author kind as declared on the wire.
        sender: Sender,
        /// Display name captured at send time.
        sender_name: String,
        /// Message body.
        text: String,
    },
    /// An agent (or the user) ends the conversation.
    CloseSession {
        /// Session being closed.
        session_id: SessionId,
    },
}

/// Events flowing from the routing engine back to connections.
#[derive(Debug, Clone)]
pub enum OutboundEvent {
    /// Reply to `start_chat`: the session plus replayed history.
    ChatStarted {
        /// The open session's ID.
        session_id: SessionId,
        /// History in append order.
        messages: Vec<Message>,
    },
    /// Reply to `agent_join`: the agent's queue view.
    AgentSessions {
        /// Waiting sessions plus the agent's own active sessions,
        /// most recent activity first.
        sessions: Vec<SessionSummary>,
    },
    /// Broadcast to every connected agent when a session is created.
    NewSession {
        /// The new session's ID.
        session_id: SessionId,
        /// Initiating user's display name.
        user_name: String,
        /// Initiating user's email.
        user_email: String,
    },
    /// Reply to the winning taker, with full history.
    SessionTaken {
        /// The claimed session's ID.
        session_id: SessionId,
        /// History in append order.
        messages: Vec<Message>,
    },
    /// Tells the user their session was picked up.
    AgentJoined {
        /// The joining agent's display name.
        agent_name: String,
    },
    /// A message relayed to the session's entitled participants.
    NewMessage(Message),
    /// The session reached its terminal state.
    SessionClosed {
        /// The closed session's ID.
        session_id: SessionId,
    },
    /// A recovered failure, reported back to the offending connection.
    Error {
        /// Stable error kind (see `ChatError::kind`).
        kind: &'static str,
        /// Human-readable description.
        message: String,
    },
}

/// The session shape delivered to agents browsing the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session ID.
    pub session_id: SessionId,
    /// Initiating user's display name.
    pub user_name: String,
    /// Initiating user's email.
    pub user_email: String,
    /// Current status.
    pub status: SessionStatus,
    /// Creation timestamp.
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// Most recent activity; orders the queue view.
    pub last_message_at: chrono::DateTime<chrono::Utc>,
}

impl From<&ChatSession> for SessionSummary {
    fn from(session: &ChatSession) -> Self {
        Self {
            session_id: session.session_id,
            user_name: session.user_name.clone(),
            user_email: session.user_email.clone(),
            status: session.status,
            started_at: session.started_at,
            last_message_at: session.last_message_at,
        }
    }
}
