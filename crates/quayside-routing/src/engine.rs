//! Routing and pairing engine.
//!
//! This module owns every session state transition: creation and queuing on
//! `start_chat`, the take race, message relay fan-out, and closure. All
//! failures are recovered here and reported back to the offending connection
//! as an `error` event; nothing escapes as a fatal error.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use quayside_core::{ConnectionId, MessageId, SessionId};
use quayside_store::{ChatSession, Message, Sender, SessionStatus, Store, StoreError};

use crate::error::{ChatError, Result};
use crate::events::{AgentIdentity, InboundEvent, OutboundEvent, SessionSummary, UserIdentity};
use crate::lifecycle;
use crate::presence::PresenceRegistry;

/// Display name attached to system-generated notices.
const BOT_NAME: &str = "Bot";

/// Text of the closure notice appended before a session terminates.
const SESSION_CLOSED_TEXT: &str = "Sohbet sonlandırıldı.";

fn welcome_text(user_name: &str) -> String {
    format!(
        "Merhaba {user_name}! Size nasıl yardımcı olabiliriz? \
         Bir temsilci en kısa sürede sizinle iletişime geçecektir."
    )
}

fn agent_joined_text(agent_name: &str) -> String {
    format!("{agent_name} sohbete katıldı.")
}

/// Delivery side of the channel gateway, as seen by the engine.
///
/// Delivery is fire-and-forget with at-most-once semantics per call: an
/// implementation must swallow transport failures (logging them at most)
/// because conversation durability lives in the store, not in delivery
/// guarantees.
pub trait Outbox: Send + Sync {
    /// Queue an event for delivery to one connection.
    fn deliver(&self, connection_id: ConnectionId, event: OutboundEvent);
}

/// Who may close a session that has an assigned agent.
///
/// The original product let any agent close any session because its close
/// handler never checked the assignment. That behavior is preserved as the
/// default, but as a named policy rather than a missing validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClosePolicy {
    /// Any agent may close any open session.
    #[default]
    AnyAgent,
    /// An `active` session may only be closed by its assigned agent.
    /// `waiting` sessions remain closeable by any agent.
    AssignedAgentOnly,
}

/// Configuration for the routing engine.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// Close authorization policy.
    pub close_policy: ClosePolicy,
    /// Maximum number of history messages replayed on `chat_started` and
    /// `session_taken`.
    pub history_limit: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            close_policy: ClosePolicy::default(),
            history_limit: 100,
        }
    }
}

/// Trait defining the routing operations the gateway drives.
///
/// `dispatch` never fails from the caller's perspective: errors are turned
/// into `error` events on the offending connection.
#[async_trait]
pub trait ChatRouter: Send + Sync {
    /// Route one inbound event from a connection.
    async fn dispatch(&self, connection_id: ConnectionId, event: InboundEvent);

    /// Clean up after a connection went away.
    ///
    /// Removes presence and channel bindings only; sessions are left in
    /// whatever state they were in (a user may reconnect and resume, an
    /// agent's active sessions stay active but orphaned).
    async fn disconnect(&self, connection_id: ConnectionId);

    /// Close a session administratively, bypassing the close policy.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::SessionNotFound` or `ChatError::SessionClosed`.
    async fn close_session_admin(&self, session_id: SessionId) -> Result<()>;
}

/// Which live connections a session is currently wired to.
#[derive(Debug, Clone, Copy, Default)]
struct SessionBinding {
    user_conn: Option<ConnectionId>,
    agent_conn: Option<ConnectionId>,
}

impl SessionBinding {
    const fn is_empty(self) -> bool {
        self.user_conn.is_none() && self.agent_conn.is_none()
    }
}

/// The routing engine implementation.
pub struct RoutingEngine<S: Store, O: Outbox> {
    store: Arc<S>,
    outbox: Arc<O>,
    presence: PresenceRegistry,
    bindings: RwLock<HashMap<SessionId, SessionBinding>>,
    config: RoutingConfig,
}

impl<S: Store, O: Outbox> RoutingEngine<S, O> {
    /// Create a new routing engine.
    #[must_use]
    pub fn new(store: Arc<S>, outbox: Arc<O>, config: RoutingConfig) -> Self {
        Self {
            store,
            outbox,
            presence: PresenceRegistry::new(),
            bindings: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Create with default configuration.
    #[must_use]
    pub fn with_defaults(store: Arc<S>, outbox: Arc<O>) -> Self {
        Self::new(store, outbox, RoutingConfig::default())
    }

    /// The presence registry.
    #[must_use]
    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    /// Replay history for a session, capped at the configured limit.
    fn history(&self, session_id: &SessionId) -> Result<Vec<Message>> {
        let mut messages = self.store.list_messages(session_id)?;
        messages.truncate(self.config.history_limit);
        Ok(messages)
    }

    /// Append a system-generated notice to a session's history.
    fn append_bot(&self, session_id: &SessionId, text: String) -> Result<Message> {
        let message = Message {
            message_id: MessageId::generate(),
            session_id: *session_id,
            sender: Sender::Bot,
            sender_name: BOT_NAME.to_string(),
            text,
            timestamp: Utc::now(),
        };
        Ok(self.store.append_message(&message)?)
    }

    /// Deliver an event to whichever of the session's connections are live.
    fn relay_to_binding(&self, session_id: &SessionId, event: &OutboundEvent) {
        let binding = self
            .bindings
            .read()
            .get(session_id)
            .copied()
            .unwrap_or_default();

        if let Some(conn) = binding.user_conn {
            self.outbox.deliver(conn, event.clone());
        }
        if let Some(conn) = binding.agent_conn {
            self.outbox.deliver(conn, event.clone());
        }
    }

    fn bind_user(&self, session_id: SessionId, conn: ConnectionId) {
        self.bindings.write().entry(session_id).or_default().user_conn = Some(conn);
    }

    fn bind_agent(&self, session_id: SessionId, conn: ConnectionId) {
        self.bindings
            .write()
            .entry(session_id)
            .or_default()
            .agent_conn = Some(conn);
    }

    // =========================================================================
    // Event handlers
    // =========================================================================

    fn handle_start_chat(&self, conn: ConnectionId, user: UserIdentity) -> Result<()> {
        self.presence.register_user(conn, user.user_id);

        // One open session per user: a second start_chat resumes it
        if let Some(existing) = self.store.find_open_session_for_user(&user.user_id)? {
            self.bind_user(existing.session_id, conn);

            let messages = self.history(&existing.session_id)?;
            self.outbox.deliver(
                conn,
                OutboundEvent::ChatStarted {
                    session_id: existing.session_id,
                    messages,
                },
            );

            tracing::info!(
                session_id = %existing.session_id,
                user_id = %user.user_id,
                "Resumed open session"
            );
            return Ok(());
        }

        let now = Utc::now();
        let session = ChatSession {
            session_id: SessionId::generate(),
            user_id: user.user_id,
            user_name: user.user_name.clone(),
            user_email: user.user_email.clone(),
            status: SessionStatus::Waiting,
            agent_id: None,
            agent_name: None,
            started_at: now,
            closed_at: None,
            last_message_at: now,
            message_count: 0,
        };
        self.store.put_session(&session)?;

        let welcome = self.append_bot(&session.session_id, welcome_text(&user.user_name))?;
        self.bind_user(session.session_id, conn);

        // Sessions queue even with zero agents online
        for agent in self.presence.list_agents() {
            self.outbox.deliver(
                agent.connection_id,
                OutboundEvent::NewSession {
                    session_id: session.session_id,
                    user_name: user.user_name.clone(),
                    user_email: user.user_email.clone(),
                },
            );
        }

        self.outbox.deliver(
            conn,
            OutboundEvent::ChatStarted {
                session_id: session.session_id,
                messages: vec![welcome],
            },
        );

        tracing::info!(
            session_id = %session.session_id,
            user_id = %user.user_id,
            "Created session"
        );

        Ok(())
    }

    fn handle_agent_join(&self, conn: ConnectionId, agent: AgentIdentity) -> Result<()> {
        self.presence
            .register_agent(conn, agent.agent_id, &agent.agent_name);

        // Queue view: every waiting session, plus this agent's own active
        // sessions. Sessions taken by someone else are not shown.
        let mut sessions = self.store.list_sessions_by_status(SessionStatus::Waiting)?;
        for session in self.store.list_sessions_by_status(SessionStatus::Active)? {
            if session.agent_id == Some(agent.agent_id) {
                // Rejoining agent picks its conversations back up
                self.bind_agent(session.session_id, conn);
                sessions.push(session);
            }
        }
        sessions.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));

        self.outbox.deliver(
            conn,
            OutboundEvent::AgentSessions {
                sessions: sessions.iter().map(SessionSummary::from).collect(),
            },
        );

        tracing::info!(
            agent_id = %agent.agent_id,
            agent_name = %agent.agent_name,
            "Agent joined"
        );

        Ok(())
    }

    fn handle_take(
        &self,
        conn: ConnectionId,
        session_id: SessionId,
        agent: AgentIdentity,
    ) -> Result<()> {
        let session = self
            .store
            .get_session(&session_id)?
            .ok_or(ChatError::SessionNotFound(session_id))?;

        if lifecycle::is_terminal(session.status) {
            return Err(ChatError::SessionClosed(session_id));
        }
        if !lifecycle::can_take(session.status) {
            return Err(ChatError::AlreadyAssigned(session_id));
        }

        // Taking implies presence, even if the agent skipped agent_join
        self.presence
            .register_agent(conn, agent.agent_id, &agent.agent_name);

        // The compare-and-set in the store decides the race
        let session = match self
            .store
            .assign_agent(&session_id, &agent.agent_id, &agent.agent_name)
        {
            Ok(session) => session,
            Err(StoreError::Conflict(_)) => return Err(self.classify_conflict(session_id)),
            Err(StoreError::NotFound) => return Err(ChatError::SessionNotFound(session_id)),
            Err(e) => return Err(e.into()),
        };

        self.append_bot(&session_id, agent_joined_text(&agent.agent_name))?;
        self.bind_agent(session_id, conn);

        let messages = self.history(&session_id)?;
        self.outbox.deliver(
            conn,
            OutboundEvent::SessionTaken {
                session_id,
                messages,
            },
        );

        let user_conn = self
            .bindings
            .read()
            .get(&session_id)
            .and_then(|b| b.user_conn);
        if let Some(user_conn) = user_conn {
            self.outbox.deliver(
                user_conn,
                OutboundEvent::AgentJoined {
                    agent_name: agent.agent_name.clone(),
                },
            );
        }

        tracing::info!(
            session_id = %session_id,
            agent_id = %agent.agent_id,
            user_id = %session.user_id,
            "Session taken"
        );

        Ok(())
    }

    /// Decide what a lost assignment race actually was.
    fn classify_conflict(&self, session_id: SessionId) -> ChatError {
        match self.store.get_session(&session_id) {
            Ok(Some(session)) if lifecycle::is_terminal(session.status) => {
                ChatError::SessionClosed(session_id)
            }
            Ok(Some(_)) => ChatError::AlreadyAssigned(session_id),
            Ok(None) => ChatError::SessionNotFound(session_id),
            Err(e) => e.into(),
        }
    }

    fn handle_send(
        &self,
        session_id: SessionId,
        sender: Sender,
        sender_name: String,
        text: String,
    ) -> Result<()> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let session = self
            .store
            .get_session(&session_id)?
            .ok_or(ChatError::SessionNotFound(session_id))?;

        if lifecycle::is_terminal(session.status) {
            return Err(ChatError::SessionClosed(session_id));
        }
        if !lifecycle::may_send(session.status, sender) {
            // An agent cannot speak into a session it has not taken
            return Err(ChatError::NotSessionAgent(session_id));
        }

        let message = Message {
            message_id: MessageId::generate(),
            session_id,
            sender,
            sender_name,
            text,
            timestamp: Utc::now(),
        };
        let stored = match self.store.append_message(&message) {
            Ok(stored) => stored,
            // Lost a race with a concurrent close
            Err(StoreError::Conflict(_)) => return Err(ChatError::SessionClosed(session_id)),
            Err(e) => return Err(e.into()),
        };

        self.relay_to_binding(&session_id, &OutboundEvent::NewMessage(stored));

        Ok(())
    }

    fn handle_close(&self, requester: Option<ConnectionId>, session_id: SessionId) -> Result<()> {
        let session = self
            .store
            .get_session(&session_id)?
            .ok_or(ChatError::SessionNotFound(session_id))?;

        if lifecycle::is_terminal(session.status) {
            return Err(ChatError::SessionClosed(session_id));
        }

        if let Some(conn) = requester {
            self.enforce_close_policy(conn, &session)?;
        }

        // The store appends the notice and closes in one atomic write, so a
        // losing concurrent close leaves no duplicate notice behind
        let notice = Message {
            message_id: MessageId::generate(),
            session_id,
            sender: Sender::Bot,
            sender_name: BOT_NAME.to_string(),
            text: SESSION_CLOSED_TEXT.to_string(),
            timestamp: Utc::now(),
        };
        if self.store.close_session(&session_id, &notice)?.is_none() {
            // Lost the race; the winner notified
            return Err(ChatError::SessionClosed(session_id));
        }

        self.relay_to_binding(&session_id, &OutboundEvent::SessionClosed { session_id });
        self.bindings.write().remove(&session_id);

        tracing::info!(session_id = %session_id, "Session closed");

        Ok(())
    }

    /// Apply the configured close policy for a requester connection.
    fn enforce_close_policy(&self, conn: ConnectionId, session: &ChatSession) -> Result<()> {
        match self.config.close_policy {
            ClosePolicy::AnyAgent => Ok(()),
            ClosePolicy::AssignedAgentOnly => {
                if session.status != SessionStatus::Active {
                    // Waiting sessions stay closeable by anyone
                    return Ok(());
                }
                let presence = self
                    .presence
                    .agent(conn)
                    .ok_or(ChatError::UnknownConnection(conn))?;
                if session.agent_id == Some(presence.agent_id) {
                    Ok(())
                } else {
                    Err(ChatError::NotSessionAgent(session.session_id))
                }
            }
        }
    }

    fn handle_disconnect(&self, conn: ConnectionId) {
        if let Some(agent) = self.presence.unregister(conn) {
            tracing::info!(
                agent_id = %agent.agent_id,
                "Agent disconnected; in-progress sessions stay active"
            );
        }

        // Unbind the dead connection everywhere; sessions are untouched
        let mut bindings = self.bindings.write();
        bindings.retain(|_, binding| {
            if binding.user_conn == Some(conn) {
                binding.user_conn = None;
            }
            if binding.agent_conn == Some(conn) {
                binding.agent_conn = None;
            }
            !binding.is_empty()
        });
    }
}

#[async_trait]
impl<S: Store + 'static, O: Outbox + 'static> ChatRouter for RoutingEngine<S, O> {
    async fn dispatch(&self, connection_id: ConnectionId, event: InboundEvent) {
        let result = match event {
            InboundEvent::StartChat(user) => self.handle_start_chat(connection_id, user),
            InboundEvent::AgentJoin(agent) => self.handle_agent_join(connection_id, agent),
            InboundEvent::TakeSession { session_id, agent } => {
                self.handle_take(connection_id, session_id, agent)
            }
            InboundEvent::SendMessage {
                session_id,
                sender,
                sender_name,
                text,
            } => self.handle_send(session_id, sender, sender_name, text),
            InboundEvent::CloseSession { session_id } => {
                self.handle_close(Some(connection_id), session_id)
            }
        };

        if let Err(error) = result {
            tracing::debug!(
                connection_id = %connection_id,
                error = %error,
                kind = error.kind(),
                "Recovered routing error"
            );
            self.outbox.deliver(
                connection_id,
                OutboundEvent::Error {
                    kind: error.kind(),
                    message: error.to_string(),
                },
            );
        }
    }

    async fn disconnect(&self, connection_id: ConnectionId) {
        self.handle_disconnect(connection_id);
    }

    async fn close_session_admin(&self, session_id: SessionId) -> Result<()> {
        self.handle_close(None, session_id)
    }
}
