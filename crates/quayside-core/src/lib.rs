//! Core types and utilities for quayside chat.
//!
//! This crate provides the foundational types used throughout the chat
//! backend: strongly-typed IDs for users, agents, sessions, messages, and
//! channel connections. Each layer defines its own error type on top of
//! these (`StoreError`, `ChatError`, `ApiError`).
//!
//! # Example
//!
//! ```
//! use quayside_core::{SessionId, UserId};
//!
//! // Generate a session ID
//! let session_id = SessionId::generate();
//!
//! // Parse a user ID from its string form
//! let user_id: UserId = "7e2f1f6a-4f2e-4d57-9c3b-0a8f6d2e1b4c".parse().unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;

pub use ids::{AgentId, ConnectionId, IdError, MessageId, SessionId, UserId};
