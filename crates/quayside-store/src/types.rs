//! Domain types stored in the database.
//!
//! These types represent the persisted state of chat sessions and their
//! message history.

use chrono::{DateTime, Utc};
use quayside_core::{AgentId, MessageId, SessionId, UserId};
use serde::{Deserialize, Serialize};

/// A chat session record stored in the database.
///
/// The initiating user's identity is captured at creation and never changes.
/// `agent_id`/`agent_name` are set exactly once, when an agent takes the
/// session, and are only cleared by deleting the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique identifier for the session.
    pub session_id: SessionId,
    /// Initiating end user.
    pub user_id: UserId,
    /// User display name, captured at creation.
    pub user_name: String,
    /// User email, captured at creation.
    pub user_email: String,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// Assigned agent, set on take.
    pub agent_id: Option<AgentId>,
    /// Assigned agent's display name, set on take.
    pub agent_name: Option<String>,
    /// Creation timestamp.
    pub started_at: DateTime<Utc>,
    /// When the session was closed (if closed).
    pub closed_at: Option<DateTime<Utc>>,
    /// Timestamp of the most recent activity (message append or take).
    /// Orders the agent-facing queue view.
    pub last_message_at: DateTime<Utc>,
    /// Number of messages appended so far. Also the next message sequence.
    pub message_count: u64,
}

impl ChatSession {
    /// True while the session can still receive events (`waiting` or `active`).
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.status, SessionStatus::Waiting | SessionStatus::Active)
    }
}

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SessionStatus {
    /// Created, queued, no agent assigned yet.
    Waiting = 1,
    /// Taken by an agent; both sides may exchange messages.
    Active = 2,
    /// Terminated. No further transitions or messages.
    Closed = 3,
}

impl SessionStatus {
    /// Convert the status to its numeric representation.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Try to convert a numeric value to a `SessionStatus`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Waiting),
            2 => Some(Self::Active),
            3 => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The initiating end user.
    User,
    /// The assigned support agent.
    Agent,
    /// System-generated notice (welcome, agent joined, session closed).
    Bot,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for the message.
    pub message_id: MessageId,
    /// Owning session.
    pub session_id: SessionId,
    /// Message author kind.
    pub sender: Sender,
    /// Display name captured at send time.
    pub sender_name: String,
    /// Message body. Non-empty for user/agent messages.
    pub text: String,
    /// Creation time. Non-decreasing within a session's history.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_u8_roundtrip() {
        for status in [
            SessionStatus::Waiting,
            SessionStatus::Active,
            SessionStatus::Closed,
        ] {
            assert_eq!(SessionStatus::from_u8(status.as_u8()), Some(status));
        }
        assert_eq!(SessionStatus::from_u8(0), None);
        assert_eq!(SessionStatus::from_u8(4), None);
    }

    #[test]
    fn open_statuses() {
        let mut session = ChatSession {
            session_id: SessionId::generate(),
            user_id: UserId::from_uuid(uuid::Uuid::new_v4()),
            user_name: "Ayşe".to_string(),
            user_email: "ayse@example.com".to_string(),
            status: SessionStatus::Waiting,
            agent_id: None,
            agent_name: None,
            started_at: Utc::now(),
            closed_at: None,
            last_message_at: Utc::now(),
            message_count: 0,
        };
        assert!(session.is_open());
        session.status = SessionStatus::Active;
        assert!(session.is_open());
        session.status = SessionStatus::Closed;
        assert!(!session.is_open());
    }

    #[test]
    fn sender_serde_names() {
        assert_eq!(serde_json::to_string(&Sender::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Sender::Agent).unwrap(), "\"agent\"");
        assert_eq!(serde_json::to_string(&Sender::Bot).unwrap(), "\"bot\"");
    }
}
