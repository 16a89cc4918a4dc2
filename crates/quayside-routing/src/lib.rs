//! Routing and pairing engine for quayside chat sessions.
//!
//! This crate holds the business logic between the channel gateway and the
//! store: session creation and queuing, the agent take race, message relay,
//! and closure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Gateway (HTTP/WebSocket)                  │
//! └─────────────────────────────────────────────────────────────┘
//!            │ InboundEvent                  ▲ OutboundEvent
//!            ▼                               │ (via Outbox)
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RoutingEngine                         │
//! │  ┌─────────────┐ ┌──────────────┐ ┌──────────────────────┐  │
//! │  │  Lifecycle  │ │   Presence   │ │   Session Bindings   │  │
//! │  │  Guards     │ │   Registry   │ │   (conn fan-out)     │  │
//! │  └─────────────┘ └──────────────┘ └──────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                       ┌──────────────┐
//!                       │    Store     │
//!                       │  (RocksDB)   │
//!                       └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use quayside_core::ConnectionId;
//! use quayside_routing::{ChatRouter, InboundEvent, OutboundEvent, Outbox, RoutingEngine, UserIdentity};
//! use quayside_store::RocksStore;
//!
//! struct LogOutbox;
//!
//! impl Outbox for LogOutbox {
//!     fn deliver(&self, connection_id: ConnectionId, event: OutboundEvent) {
//!         println!("{connection_id}: {event:?}");
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/quayside")?);
//! let engine = RoutingEngine::with_defaults(store, Arc::new(LogOutbox));
//!
//! let conn = ConnectionId::generate();
//! engine
//!     .dispatch(
//!         conn,
//!         InboundEvent::StartChat(UserIdentity {
//!             user_id: "7f2c1f6e-8f04-4c39-9d55-2a2e6d6f2b10".parse()?,
//!             user_name: "Ayşe".into(),
//!             user_email: "ayse@example.com".into(),
//!         }),
//!     )
//!     .await;
//! # Ok(())
//! # }
//! ```
//!
//! # State Machine
//!
//! Sessions follow a strict, monotonic state machine:
//!
//! - `Waiting` → `Active` (agent take) or `Closed`
//! - `Active` → `Closed`
//! - `Closed` is terminal
//!
//! See the [`lifecycle`] module for transition validation helpers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod engine;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod presence;

pub use engine::{ChatRouter, ClosePolicy, Outbox, RoutingConfig, RoutingEngine};
pub use error::{ChatError, Result};
pub use events::{AgentIdentity, InboundEvent, OutboundEvent, SessionSummary, UserIdentity};
pub use presence::{AgentPresence, PresenceRegistry};

// Re-export commonly used types from dependencies for convenience
pub use quayside_core::{AgentId, ConnectionId, SessionId, UserId};
pub use quayside_store::{ChatSession, Message, Sender, SessionStatus};
