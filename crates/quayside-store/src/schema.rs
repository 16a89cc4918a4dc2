//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary session records, keyed by `session_id`.
    pub const SESSIONS: &str = "sessions";

    /// Index: sessions by status, keyed by `status || session_id`.
    pub const SESSIONS_BY_STATUS: &str = "sessions_by_status";

    /// Index: sessions by user, keyed by `user_id || session_id`.
    pub const SESSIONS_BY_USER: &str = "sessions_by_user";

    /// Message history, keyed by `session_id || seq`. Iterating a session
    /// prefix yields messages in append order.
    pub const MESSAGES: &str = "messages";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::SESSIONS,
        cf::SESSIONS_BY_STATUS,
        cf::SESSIONS_BY_USER,
        cf::MESSAGES,
    ]
}
