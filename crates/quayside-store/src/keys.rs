//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions to encode and decode keys for various
//! indexes. All keys are designed to support efficient prefix scans, and
//! message keys embed a big-endian sequence number so a prefix scan yields
//! history in append order.

use quayside_core::{SessionId, UserId};

/// Encode a session key (just the session ID bytes).
#[must_use]
pub fn session_key(session_id: &SessionId) -> Vec<u8> {
    session_id.as_bytes().to_vec()
}

/// Encode a status-session index key: `status || session_id`.
///
/// This allows efficient prefix scans for all sessions with a given status.
#[must_use]
pub fn status_session_key(status: u8, session_id: &SessionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(17);
    key.push(status);
    key.extend_from_slice(session_id.as_bytes());
    key
}

/// Encode a status prefix for scanning all sessions by status.
#[must_use]
pub fn status_prefix(status: u8) -> Vec<u8> {
    vec![status]
}

/// Extract the session ID from a status-session key.
///
/// # Panics
///
/// Panics if the key is not at least 17 bytes.
#[must_use]
pub fn extract_session_id_from_status_key(key: &[u8]) -> SessionId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[1..17]);
    SessionId::from_uuid(uuid::Uuid::from_bytes(bytes))
}

/// Encode a user-session index key: `user_id || session_id`.
///
/// This allows efficient prefix scans for all sessions opened by a user.
#[must_use]
pub fn user_session_key(user_id: &UserId, session_id: &SessionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(session_id.as_bytes());
    key
}

/// Encode a user prefix for scanning all sessions by user.
#[must_use]
pub fn user_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the session ID from a user-session key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_session_id_from_user_session_key(key: &[u8]) -> SessionId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    SessionId::from_uuid(uuid::Uuid::from_bytes(bytes))
}

/// Encode a message key: `session_id || seq` with a big-endian sequence.
#[must_use]
pub fn message_key(session_id: &SessionId, seq: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(24);
    key.extend_from_slice(session_id.as_bytes());
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

/// Encode a session prefix for scanning that session's messages.
#[must_use]
pub fn message_prefix(session_id: &SessionId) -> Vec<u8> {
    session_id.as_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_session_key_roundtrip() {
        let user_id = UserId::from_uuid(uuid::Uuid::new_v4());
        let session_id = SessionId::generate();

        let key = user_session_key(&user_id, &session_id);
        assert_eq!(key.len(), 32);

        let extracted = extract_session_id_from_user_session_key(&key);
        assert_eq!(extracted, session_id);
    }

    #[test]
    fn status_session_key_roundtrip() {
        let session_id = SessionId::generate();

        let key = status_session_key(1, &session_id);
        assert_eq!(key.len(), 17);

        let extracted = extract_session_id_from_status_key(&key);
        assert_eq!(extracted, session_id);
    }

    #[test]
    fn message_keys_sort_in_append_order() {
        let session_id = SessionId::generate();
        let prefix = message_prefix(&session_id);

        let k0 = message_key(&session_id, 0);
        let k1 = message_key(&session_id, 1);
        let k256 = message_key(&session_id, 256);

        assert!(k0.starts_with(&prefix));
        assert!(k0 < k1);
        assert!(k1 < k256);
    }
}
