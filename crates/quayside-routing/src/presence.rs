//! Presence registry for connected participants.
//!
//! Tracks which agents are currently connected (and under what identity)
//! and which user each open user channel belongs to. Presence is purely
//! in-memory state keyed by connection: entries never outlive the
//! connection and removal never touches session records, which belong to
//! the routing engine and the store.

use std::collections::HashMap;

use parking_lot::RwLock;
use quayside_core::{AgentId, ConnectionId, UserId};

/// A connected agent's presence entry.
#[derive(Debug, Clone)]
pub struct AgentPresence {
    /// The agent's identity.
    pub agent_id: AgentId,
    /// The agent's display name.
    pub agent_name: String,
    /// The connection this presence is bound to.
    pub connection_id: ConnectionId,
}

/// Registry of connected agents and user channels.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    agents: RwLock<HashMap<ConnectionId, AgentPresence>>,
    users: RwLock<HashMap<ConnectionId, UserId>>,
}

impl PresenceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite an agent presence entry for a connection.
    ///
    /// A second connection from the same agent identity is an independent
    /// entry, not a merge.
    pub fn register_agent(&self, connection_id: ConnectionId, agent_id: AgentId, agent_name: &str) {
        self.agents.write().insert(
            connection_id,
            AgentPresence {
                agent_id,
                agent_name: agent_name.to_string(),
                connection_id,
            },
        );
    }

    /// Bind a user channel to its user identity.
    pub fn register_user(&self, connection_id: ConnectionId, user_id: UserId) {
        self.users.write().insert(connection_id, user_id);
    }

    /// Remove whatever presence the connection held. Does not close
    /// sessions bound to an agent.
    pub fn unregister(&self, connection_id: ConnectionId) -> Option<AgentPresence> {
        self.users.write().remove(&connection_id);
        self.agents.write().remove(&connection_id)
    }

    /// Look up the agent presence behind a connection.
    #[must_use]
    pub fn agent(&self, connection_id: ConnectionId) -> Option<AgentPresence> {
        self.agents.read().get(&connection_id).cloned()
    }

    /// Look up the user behind a connection.
    #[must_use]
    pub fn user(&self, connection_id: ConnectionId) -> Option<UserId> {
        self.users.read().get(&connection_id).copied()
    }

    /// Snapshot of all connected agents, used for queue broadcasts.
    #[must_use]
    pub fn list_agents(&self) -> Vec<AgentPresence> {
        self.agents.read().values().cloned().collect()
    }

    /// True if at least one agent is connected.
    #[must_use]
    pub fn any_agent_online(&self) -> bool {
        !self.agents.read().is_empty()
    }
}
