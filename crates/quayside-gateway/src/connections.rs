//! Connection registry and outbound delivery.
//!
//! Each WebSocket connection registers an unbounded sender here; the writer
//! half of the socket drains the paired receiver. The registry is the
//! gateway's [`Outbox`] implementation: deliveries to a connection that has
//! gone away are dropped and logged, never retried. Conversation durability
//! lives in the store.

use std::collections::HashMap;

use parking_lot::RwLock;
use quayside_core::ConnectionId;
use quayside_routing::{Outbox, OutboundEvent};
use tokio::sync::mpsc;

use crate::protocol::ServerFrame;

/// Registry of live connections and their outbound queues.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    senders: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<ServerFrame>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, returning the receiver its writer task drains.
    #[must_use]
    pub fn register(&self, connection_id: ConnectionId) -> mpsc::UnboundedReceiver<ServerFrame> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.write().insert(connection_id, tx);
        rx
    }

    /// Remove a connection. Queued frames that were never drained are lost.
    pub fn unregister(&self, connection_id: ConnectionId) {
        self.senders.write().remove(&connection_id);
    }

    /// Queue a frame for one connection.
    pub fn send(&self, connection_id: ConnectionId, frame: ServerFrame) {
        let sender = self.senders.read().get(&connection_id).cloned();
        match sender {
            Some(sender) => {
                if sender.send(frame).is_err() {
                    tracing::debug!(
                        connection_id = %connection_id,
                        "Dropped frame for closing connection"
                    );
                }
            }
            None => {
                tracing::debug!(
                    connection_id = %connection_id,
                    "Dropped frame for unknown connection"
                );
            }
        }
    }

    /// Number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.senders.read().len()
    }

    /// True if no connections are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senders.read().is_empty()
    }
}

impl Outbox for ConnectionRegistry {
    fn deliver(&self, connection_id: ConnectionId, event: OutboundEvent) {
        self.send(connection_id, ServerFrame::from(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quayside_core::SessionId;

    #[test]
    fn register_send_unregister() {
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::generate();
        let mut rx = registry.register(conn);
        assert_eq!(registry.len(), 1);

        registry.deliver(
            conn,
            OutboundEvent::SessionClosed {
                session_id: SessionId::generate(),
            },
        );
        assert!(matches!(
            rx.try_recv(),
            Ok(ServerFrame::SessionClosed { .. })
        ));

        registry.unregister(conn);
        assert!(registry.is_empty());
    }

    #[test]
    fn delivery_to_unknown_connection_is_dropped() {
        let registry = ConnectionRegistry::new();
        // Must not panic
        registry.deliver(
            ConnectionId::generate(),
            OutboundEvent::SessionClosed {
                session_id: SessionId::generate(),
            },
        );
    }

    #[test]
    fn delivery_after_receiver_dropped_is_dropped() {
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::generate();
        let rx = registry.register(conn);
        drop(rx);

        registry.deliver(
            conn,
            OutboundEvent::SessionClosed {
                session_id: SessionId::generate(),
            },
        );
    }
}
