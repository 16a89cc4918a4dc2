//! Wire protocol frames.
//!
//! Clients speak the named-event protocol the product has always used:
//! every frame is a JSON object `{"event": "...", "data": {...}}` with
//! camelCase payload keys and `_id` on message and session-summary shapes.
//! This module is the only place those names exist; frames are converted to
//! and from the typed event unions before anything else sees them.

use chrono::{DateTime, Utc};
use quayside_core::{AgentId, MessageId, SessionId, UserId};
use quayside_routing::{AgentIdentity, InboundEvent, OutboundEvent, SessionSummary, UserIdentity};
use quayside_store::{Message, Sender, SessionStatus};
use serde::{Deserialize, Serialize};

/// Frames a client may send over the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientFrame {
    /// A user opens or resumes a conversation.
    #[serde(rename_all = "camelCase")]
    StartChat {
        /// User ID.
        user_id: UserId,
        /// Display name.
        user_name: String,
        /// Email address.
        user_email: String,
    },
    /// An agent comes online and requests the queue view.
    #[serde(rename_all = "camelCase")]
    AgentJoin {
        /// Agent ID.
        agent_id: AgentId,
        /// Display name.
        agent_name: String,
    },
    /// An agent claims a waiting session.
    #[serde(rename_all = "camelCase")]
    AgentTakeSession {
        /// Session being claimed.
        session_id: SessionId,
        /// Claiming agent's ID.
        agent_id: AgentId,
        /// Claiming agent's display name.
        agent_name: String,
    },
    /// Either party posts a message.
    #[serde(rename_all = "camelCase")]
    SendMessage {
        /// Owning session.
        session_id: SessionId,
        /// Author kind.
        sender: Sender,
        /// Display name captured at send time.
        sender_name: String,
        /// Message body.
        text: String,
    },
    /// End the conversation.
    #[serde(rename_all = "camelCase")]
    CloseSession {
        /// Session being closed.
        session_id: SessionId,
    },
}

impl ClientFrame {
    /// Convert this wire frame into the engine's typed inbound event.
    #[must_use]
    pub fn into_inbound(self) -> InboundEvent {
        match self {
            Self::StartChat {
                user_id,
                user_name,
                user_email,
            } => InboundEvent::StartChat(UserIdentity {
                user_id,
                user_name,
                user_email,
            }),
            Self::AgentJoin {
                agent_id,
                agent_name,
            } => InboundEvent::AgentJoin(AgentIdentity {
                agent_id,
                agent_name,
            }),
            Self::AgentTakeSession {
                session_id,
                agent_id,
                agent_name,
            } => InboundEvent::TakeSession {
                session_id,
                agent: AgentIdentity {
                    agent_id,
                    agent_name,
                },
            },
            Self::SendMessage {
                session_id,
                sender,
                sender_name,
                text,
            } => InboundEvent::SendMessage {
                session_id,
                sender,
                sender_name,
                text,
            },
            Self::CloseSession { session_id } => InboundEvent::CloseSession { session_id },
        }
    }
}

/// Frames the server pushes over the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Reply to `start_chat`.
    #[serde(rename_all = "camelCase")]
    ChatStarted {
        /// The open session's ID.
        session_id: SessionId,
        /// History in append order.
        messages: Vec<WireMessage>,
    },
    /// Reply to `agent_join`.
    AgentSessions {
        /// The agent's queue view, most recent activity first.
        sessions: Vec<WireSessionSummary>,
    },
    /// Broadcast to every connected agent on session creation.
    #[serde(rename_all = "camelCase")]
    NewSession {
        /// The new session's ID.
        session_id: SessionId,
        /// Initiating user's display name.
        user_name: String,
        /// Initiating user's email.
        user_email: String,
    },
    /// Reply to the winning taker.
    #[serde(rename_all = "camelCase")]
    SessionTaken {
        /// The claimed session's ID.
        session_id: SessionId,
        /// History in append order.
        messages: Vec<WireMessage>,
    },
    /// Tells the user their session was picked up.
    #[serde(rename_all = "camelCase")]
    AgentJoined {
        /// The joining agent's display name.
        agent_name: String,
    },
    /// A relayed chat message.
    NewMessage(WireMessage),
    /// The session reached its terminal state.
    #[serde(rename_all = "camelCase")]
    SessionClosed {
        /// The closed session's ID.
        session_id: SessionId,
    },
    /// A recovered failure, reported to the offending connection.
    Error {
        /// Stable error kind.
        kind: String,
        /// Human-readable description.
        message: String,
    },
}

impl From<OutboundEvent> for ServerFrame {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::ChatStarted {
                session_id,
                messages,
            } => Self::ChatStarted {
                session_id,
                messages: messages.into_iter().map(WireMessage::from).collect(),
            },
            OutboundEvent::AgentSessions { sessions } => Self::AgentSessions {
                sessions: sessions
                    .into_iter()
                    .map(WireSessionSummary::from)
                    .collect(),
            },
            OutboundEvent::NewSession {
                session_id,
                user_name,
                user_email,
            } => Self::NewSession {
                session_id,
                user_name,
                user_email,
            },
            OutboundEvent::SessionTaken {
                session_id,
                messages,
            } => Self::SessionTaken {
                session_id,
                messages: messages.into_iter().map(WireMessage::from).collect(),
            },
            OutboundEvent::AgentJoined { agent_name } => Self::AgentJoined { agent_name },
            OutboundEvent::NewMessage(message) => Self::NewMessage(WireMessage::from(message)),
            OutboundEvent::SessionClosed { session_id } => Self::SessionClosed { session_id },
            OutboundEvent::Error { kind, message } => Self::Error {
                kind: kind.to_string(),
                message,
            },
        }
    }
}

/// The message shape clients see: `{_id, sessionId, sender, senderName, text, timestamp}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    /// Message ID.
    #[serde(rename = "_id")]
    pub message_id: MessageId,
    /// Owning session.
    pub session_id: SessionId,
    /// Author kind.
    pub sender: Sender,
    /// Display name captured at send time.
    pub sender_name: String,
    /// Message body.
    pub text: String,
    /// Server-assigned timestamp.
    pub timestamp: DateTime<Utc>,
}

impl From<Message> for WireMessage {
    fn from(message: Message) -> Self {
        Self {
            message_id: message.message_id,
            session_id: message.session_id,
            sender: message.sender,
            sender_name: message.sender_name,
            text: message.text,
            timestamp: message.timestamp,
        }
    }
}

/// The session summary shape agents see:
/// `{_id, userName, userEmail, status, startedAt, lastMessageAt}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSessionSummary {
    /// Session ID.
    #[serde(rename = "_id")]
    pub session_id: SessionId,
    /// Initiating user's display name.
    pub user_name: String,
    /// Initiating user's email.
    pub user_email: String,
    /// Current status.
    pub status: SessionStatus,
    /// Creation timestamp.
    pub started_at: DateTime<Utc>,
    /// Most recent activity.
    pub last_message_at: DateTime<Utc>,
}

impl From<SessionSummary> for WireSessionSummary {
    fn from(summary: SessionSummary) -> Self {
        Self {
            session_id: summary.session_id,
            user_name: summary.user_name,
            user_email: summary.user_email,
            status: summary.status,
            started_at: summary.started_at,
            last_message_at: summary.last_message_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_chat_frame_roundtrip() {
        let raw = json!({
            "event": "start_chat",
            "data": {
                "userId": "7f2c1f6e-8f04-4c39-9d55-2a2e6d6f2b10",
                "userName": "Ayşe",
                "userEmail": "ayse@example.com"
            }
        });

        let frame: ClientFrame = serde_json::from_value(raw).unwrap();
        match frame.into_inbound() {
            InboundEvent::StartChat(user) => {
                assert_eq!(user.user_name, "Ayşe");
                assert_eq!(user.user_email, "ayse@example.com");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn take_frame_decodes() {
        let session_id = SessionId::generate();
        let raw = json!({
            "event": "agent_take_session",
            "data": {
                "sessionId": session_id.to_string(),
                "agentId": "9a1b8c2d-3e4f-4a5b-8c6d-7e8f9a0b1c2d",
                "agentName": "Deniz"
            }
        });

        let frame: ClientFrame = serde_json::from_value(raw).unwrap();
        match frame.into_inbound() {
            InboundEvent::TakeSession {
                session_id: sid,
                agent,
            } => {
                assert_eq!(sid, session_id);
                assert_eq!(agent.agent_name, "Deniz");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn new_message_frame_uses_wire_shape() {
        let message = Message {
            message_id: MessageId::generate(),
            session_id: SessionId::generate(),
            sender: Sender::User,
            sender_name: "Ayşe".into(),
            text: "Merhaba".into(),
            timestamp: Utc::now(),
        };

        let frame = ServerFrame::from(OutboundEvent::NewMessage(message.clone()));
        let value = serde_json::to_value(&frame).unwrap();

        assert_eq!(value["event"], "new_message");
        assert_eq!(value["data"]["_id"], message.message_id.to_string());
        assert_eq!(value["data"]["sessionId"], message.session_id.to_string());
        assert_eq!(value["data"]["sender"], "user");
        assert_eq!(value["data"]["senderName"], "Ayşe");
        assert_eq!(value["data"]["text"], "Merhaba");
    }

    #[test]
    fn session_summary_uses_wire_shape() {
        let summary = WireSessionSummary {
            session_id: SessionId::generate(),
            user_name: "Ayşe".into(),
            user_email: "ayse@example.com".into(),
            status: SessionStatus::Waiting,
            started_at: Utc::now(),
            last_message_at: Utc::now(),
        };

        let frame = ServerFrame::AgentSessions {
            sessions: vec![summary.clone()],
        };
        let value = serde_json::to_value(&frame).unwrap();

        assert_eq!(value["event"], "agent_sessions");
        let entry = &value["data"]["sessions"][0];
        assert_eq!(entry["_id"], summary.session_id.to_string());
        assert_eq!(entry["userName"], "Ayşe");
        assert_eq!(entry["status"], "waiting");
        assert!(entry.get("startedAt").is_some());
    }

    #[test]
    fn error_frame_shape() {
        let frame = ServerFrame::from(OutboundEvent::Error {
            kind: "session_closed",
            message: "session is closed".into(),
        });
        let value = serde_json::to_value(&frame).unwrap();

        assert_eq!(value["event"], "error");
        assert_eq!(value["data"]["kind"], "session_closed");
    }
}
