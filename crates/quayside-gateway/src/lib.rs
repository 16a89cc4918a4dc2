//! HTTP and WebSocket gateway for the quayside live-support service.
//!
//! This crate provides the public-facing surface of the chat service:
//!
//! - The WebSocket channel both end users and support agents connect to
//! - The wire protocol (named-event JSON frames) and its typed decoding
//! - A read-only REST surface for session records and transcripts
//! - An administrative close endpoint
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Clients                              │
//! │               (users and agents, WebSocket)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    quayside-gateway                         │
//! │  ┌─────────────┐ ┌──────────────┐ ┌─────────────────────┐   │
//! │  │   Wire      │ │  Connection  │ │   REST Handlers     │   │
//! │  │  Protocol   │ │  Registry    │ │   (read-only)       │   │
//! │  └─────────────┘ └──────────────┘ └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                      ┌──────────────┐
//!                      │RoutingEngine │
//!                      └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use quayside_gateway::{create_router, ConnectionRegistry, GatewayConfig, GatewayState};
//! use quayside_routing::RoutingEngine;
//! use quayside_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/quayside")?);
//! let connections = Arc::new(ConnectionRegistry::new());
//! let engine = Arc::new(RoutingEngine::with_defaults(
//!     Arc::clone(&store),
//!     Arc::clone(&connections),
//! ));
//!
//! let state = GatewayState::new(engine, store, connections, GatewayConfig::default());
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod connections;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use connections::ConnectionRegistry;
pub use error::ApiError;
pub use protocol::{ClientFrame, ServerFrame, WireMessage, WireSessionSummary};
pub use routes::create_router;
pub use state::GatewayState;
