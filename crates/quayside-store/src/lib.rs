//! `RocksDB` storage layer for quayside chat.
//!
//! This crate provides persistent storage for chat sessions and their message
//! history using `RocksDB` with column families for efficient indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `sessions`: Primary session records, keyed by `session_id`
//! - `sessions_by_status`: Index for listing sessions by status
//! - `sessions_by_user`: Index for finding a user's open session
//! - `messages`: Message history, keyed by `session_id || seq` so that a
//!   prefix scan yields messages in append order
//!
//! Guarded mutations (`assign_agent`, `close_session`, `append_message`) are
//! serialized behind a single write lock; `assign_agent` in particular is a
//! compare-and-set, which is what makes an agent take race resolve to at most
//! one winner.
//!
//! # Example
//!
//! ```no_run
//! use quayside_store::{RocksStore, SessionStatus, Store};
//!
//! let store = RocksStore::open("/tmp/quayside-chat-db").unwrap();
//! let waiting = store.list_sessions_by_status(SessionStatus::Waiting).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;
pub use types::{ChatSession, Message, Sender, SessionStatus};

use quayside_core::{AgentId, SessionId, UserId};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (e.g. `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Insert or update a session record.
    ///
    /// This also maintains the status and user indexes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_session(&self, session: &ChatSession) -> Result<()>;

    /// Get a session by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_session(&self, session_id: &SessionId) -> Result<Option<ChatSession>>;

    /// Delete a session and its message history.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the session doesn't exist.
    fn delete_session(&self, session_id: &SessionId) -> Result<()>;

    /// List all sessions with the given status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_sessions_by_status(&self, status: SessionStatus) -> Result<Vec<ChatSession>>;

    /// List all open (`waiting` or `active`) sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_open_sessions(&self) -> Result<Vec<ChatSession>>;

    /// List every session in the database, open and closed.
    ///
    /// Use with caution in production; prefer filtered queries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_all_sessions(&self) -> Result<Vec<ChatSession>>;

    /// Find the user's open session, if one exists.
    ///
    /// A user owns at most one open session; `start_chat` resumes it
    /// instead of creating a duplicate.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_open_session_for_user(&self, user_id: &UserId) -> Result<Option<ChatSession>>;

    /// Atomically assign an agent to a `waiting`, unassigned session and
    /// transition it to `active`.
    ///
    /// This is the compare-and-set behind the take operation: of N
    /// concurrent calls for the same session, exactly one succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the session doesn't exist, or
    /// `StoreError::Conflict` if it is not `waiting` or already has an agent.
    fn assign_agent(
        &self,
        session_id: &SessionId,
        agent_id: &AgentId,
        agent_name: &str,
    ) -> Result<ChatSession>;

    /// Atomically append the closing notice and transition the session to
    /// `closed`, setting `closed_at`.
    ///
    /// Notice and transition commit as one write: of N concurrent closes,
    /// exactly one appends the notice. Returns `Ok(None)` if the session
    /// was already closed, in which case nothing is appended and
    /// `closed_at` is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the session doesn't exist.
    fn close_session(&self, session_id: &SessionId, notice: &Message)
        -> Result<Option<ChatSession>>;

    // =========================================================================
    // Message Operations
    // =========================================================================

    /// Append a message to its session's history.
    ///
    /// The stored timestamp is clamped to be non-decreasing within the
    /// session; the (possibly adjusted) stored message is returned. Also
    /// bumps the session's `last_message_at` and `message_count`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the session doesn't exist, or
    /// `StoreError::Conflict` if it is closed.
    fn append_message(&self, message: &Message) -> Result<Message>;

    /// List a session's messages in append order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_messages(&self, session_id: &SessionId) -> Result<Vec<Message>>;
}
