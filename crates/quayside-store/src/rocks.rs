//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.
//!
//! All read-modify-write session mutations (`assign_agent`, `close_session`,
//! `append_message`, and plain `put_session`) run under one write lock. That
//! lock is the single serialization point that makes the take guard a
//! compare-and-set and keeps message sequence numbers gap-free.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use quayside_core::{AgentId, SessionId, UserId};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::types::{ChatSession, Message, SessionStatus};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read a session without taking the write lock.
    fn read_session(&self, session_id: &SessionId) -> Result<Option<ChatSession>> {
        let cf = self.cf(cf::SESSIONS)?;
        let key = keys::session_key(session_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Stage a session record and its index maintenance into a batch.
    ///
    /// Caller must hold the write lock and commit the batch; staging into
    /// the caller's batch is what lets a message append and its session
    /// record update land in one atomic write.
    fn stage_session(&self, batch: &mut WriteBatch, session: &ChatSession) -> Result<()> {
        let cf_sessions = self.cf(cf::SESSIONS)?;
        let cf_by_status = self.cf(cf::SESSIONS_BY_STATUS)?;
        let cf_by_user = self.cf(cf::SESSIONS_BY_USER)?;

        let session_key = keys::session_key(&session.session_id);
        let status_key = keys::status_session_key(session.status.as_u8(), &session.session_id);
        let user_key = keys::user_session_key(&session.user_id, &session.session_id);
        let value = Self::serialize(session)?;

        // Check the previous record to keep the status index consistent
        let old_status = self.read_session(&session.session_id)?.map(|s| s.status);

        batch.put_cf(&cf_sessions, &session_key, &value);
        batch.put_cf(&cf_by_user, &user_key, []);

        if let Some(old) = old_status {
            if old != session.status {
                let old_status_key = keys::status_session_key(old.as_u8(), &session.session_id);
                batch.delete_cf(&cf_by_status, &old_status_key);
            }
        }
        batch.put_cf(&cf_by_status, &status_key, []);

        Ok(())
    }

    /// Write a session record and maintain its indexes.
    ///
    /// Caller must hold the write lock.
    fn write_session(&self, session: &ChatSession) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.stage_session(&mut batch, session)?;
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    /// Stage a message at the session's next sequence slot and bump the
    /// session's counters, clamping the timestamp so history never goes
    /// backwards. Caller must hold the write lock and commit the batch.
    fn stage_message(
        &self,
        batch: &mut WriteBatch,
        session: &mut ChatSession,
        message: &Message,
    ) -> Result<Message> {
        let mut stored = message.clone();
        if stored.timestamp < session.last_message_at {
            stored.timestamp = session.last_message_at;
        }

        let seq = session.message_count;
        session.message_count += 1;
        session.last_message_at = stored.timestamp;

        let cf_messages = self.cf(cf::MESSAGES)?;
        let message_key = keys::message_key(&message.session_id, seq);
        let value = Self::serialize(&stored)?;
        batch.put_cf(&cf_messages, &message_key, &value);

        Ok(stored)
    }

    /// Collect sessions whose IDs appear under a status prefix.
    fn sessions_for_status(&self, status: SessionStatus) -> Result<Vec<ChatSession>> {
        let cf_by_status = self.cf(cf::SESSIONS_BY_STATUS)?;
        let prefix = keys::status_prefix(status.as_u8());

        let mut sessions = Vec::new();
        let iter = self.db.iterator_cf(
            &cf_by_status,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            let session_id = keys::extract_session_id_from_status_key(&key);
            if let Some(session) = self.read_session(&session_id)? {
                sessions.push(session);
            }
        }

        Ok(sessions)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Session Operations
    // =========================================================================

    fn put_session(&self, session: &ChatSession) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.write_session(session)
    }

    fn get_session(&self, session_id: &SessionId) -> Result<Option<ChatSession>> {
        self.read_session(session_id)
    }

    fn delete_session(&self, session_id: &SessionId) -> Result<()> {
        let _guard = self.write_lock.lock();

        let session = self.read_session(session_id)?.ok_or(StoreError::NotFound)?;

        let cf_sessions = self.cf(cf::SESSIONS)?;
        let cf_by_status = self.cf(cf::SESSIONS_BY_STATUS)?;
        let cf_by_user = self.cf(cf::SESSIONS_BY_USER)?;
        let cf_messages = self.cf(cf::MESSAGES)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_sessions, keys::session_key(session_id));
        batch.delete_cf(
            &cf_by_status,
            keys::status_session_key(session.status.as_u8(), session_id),
        );
        batch.delete_cf(
            &cf_by_user,
            keys::user_session_key(&session.user_id, session_id),
        );
        for seq in 0..session.message_count {
            batch.delete_cf(&cf_messages, keys::message_key(session_id, seq));
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_sessions_by_status(&self, status: SessionStatus) -> Result<Vec<ChatSession>> {
        self.sessions_for_status(status)
    }

    fn list_open_sessions(&self) -> Result<Vec<ChatSession>> {
        let mut sessions = self.sessions_for_status(SessionStatus::Waiting)?;
        sessions.extend(self.sessions_for_status(SessionStatus::Active)?);
        Ok(sessions)
    }

    fn list_all_sessions(&self) -> Result<Vec<ChatSession>> {
        let cf = self.cf(cf::SESSIONS)?;

        let mut sessions = Vec::new();
        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);

        for item in iter {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let session: ChatSession = Self::deserialize(&value)?;
            sessions.push(session);
        }

        Ok(sessions)
    }

    fn find_open_session_for_user(&self, user_id: &UserId) -> Result<Option<ChatSession>> {
        let cf_by_user = self.cf(cf::SESSIONS_BY_USER)?;
        let prefix = keys::user_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            let session_id = keys::extract_session_id_from_user_session_key(&key);
            if let Some(session) = self.read_session(&session_id)? {
                if session.is_open() {
                    return Ok(Some(session));
                }
            }
        }

        Ok(None)
    }

    fn assign_agent(
        &self,
        session_id: &SessionId,
        agent_id: &AgentId,
        agent_name: &str,
    ) -> Result<ChatSession> {
        let _guard = self.write_lock.lock();

        let mut session = self.read_session(session_id)?.ok_or(StoreError::NotFound)?;

        // Compare-and-set: only an unassigned waiting session can be taken
        if session.status != SessionStatus::Waiting || session.agent_id.is_some() {
            return Err(StoreError::Conflict(format!(
                "session {session_id} is not available for assignment"
            )));
        }

        session.status = SessionStatus::Active;
        session.agent_id = Some(*agent_id);
        session.agent_name = Some(agent_name.to_string());
        session.last_message_at = chrono::Utc::now();

        self.write_session(&session)?;
        Ok(session)
    }

    fn close_session(&self, session_id: &SessionId, notice: &Message) -> Result<Option<ChatSession>> {
        let _guard = self.write_lock.lock();

        let mut session = self.read_session(session_id)?.ok_or(StoreError::NotFound)?;

        if session.status == SessionStatus::Closed {
            return Ok(None); // Already closed; closed_at stays untouched, no notice
        }

        // Notice and transition commit together: of N concurrent closes,
        // exactly one appends the notice
        let mut batch = WriteBatch::default();
        self.stage_message(&mut batch, &mut session, notice)?;

        session.status = SessionStatus::Closed;
        session.closed_at = Some(chrono::Utc::now());
        self.stage_session(&mut batch, &session)?;

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Some(session))
    }

    // =========================================================================
    // Message Operations
    // =========================================================================

    fn append_message(&self, message: &Message) -> Result<Message> {
        let _guard = self.write_lock.lock();

        let mut session = self
            .read_session(&message.session_id)?
            .ok_or(StoreError::NotFound)?;

        if session.status == SessionStatus::Closed {
            return Err(StoreError::Conflict(format!(
                "session {} is closed",
                message.session_id
            )));
        }

        // Message and session counters land in one atomic write; a message
        // at seq N must never exist without the count that reserves N
        let mut batch = WriteBatch::default();
        let stored = self.stage_message(&mut batch, &mut session, message)?;
        self.stage_session(&mut batch, &session)?;

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(stored)
    }

    fn list_messages(&self, session_id: &SessionId) -> Result<Vec<Message>> {
        let cf_messages = self.cf(cf::MESSAGES)?;
        let prefix = keys::message_prefix(session_id);

        let mut messages = Vec::new();
        let iter = self.db.iterator_cf(
            &cf_messages,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            let message: Message = Self::deserialize(&value)?;
            messages.push(message);
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sender;
    use chrono::{Duration, Utc};
    use quayside_core::MessageId;
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn create_test_session(user_id: &UserId) -> ChatSession {
        let now = Utc::now();
        ChatSession {
            session_id: SessionId::generate(),
            user_id: *user_id,
            user_name: "Mehmet".to_string(),
            user_email: "mehmet@example.com".to_string(),
            status: SessionStatus::Waiting,
            agent_id: None,
            agent_name: None,
            started_at: now,
            closed_at: None,
            last_message_at: now,
            message_count: 0,
        }
    }

    fn create_test_message(session_id: &SessionId, text: &str) -> Message {
        Message {
            message_id: MessageId::generate(),
            session_id: *session_id,
            sender: Sender::User,
            sender_name: "Mehmet".to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
        }
    }

    fn closing_notice(session_id: &SessionId) -> Message {
        Message {
            message_id: MessageId::generate(),
            session_id: *session_id,
            sender: Sender::Bot,
            sender_name: "Bot".to_string(),
            text: "Sohbet sonlandırıldı.".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn session_crud() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::from_uuid(uuid::Uuid::new_v4());
        let session = create_test_session(&user_id);

        // Create
        store.put_session(&session).unwrap();

        // Read
        let retrieved = store.get_session(&session.session_id).unwrap().unwrap();
        assert_eq!(retrieved.user_name, "Mehmet");
        assert_eq!(retrieved.status, SessionStatus::Waiting);

        // Delete
        store.delete_session(&session.session_id).unwrap();
        assert!(store.get_session(&session.session_id).unwrap().is_none());
    }

    #[test]
    fn status_index_updated_on_assignment() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::from_uuid(uuid::Uuid::new_v4());
        let session = create_test_session(&user_id);
        store.put_session(&session).unwrap();

        assert_eq!(
            store
                .list_sessions_by_status(SessionStatus::Waiting)
                .unwrap()
                .len(),
            1
        );

        let agent_id = AgentId::from_uuid(uuid::Uuid::new_v4());
        store
            .assign_agent(&session.session_id, &agent_id, "Deniz")
            .unwrap();

        assert!(store
            .list_sessions_by_status(SessionStatus::Waiting)
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .list_sessions_by_status(SessionStatus::Active)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn assign_agent_is_compare_and_set() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::from_uuid(uuid::Uuid::new_v4());
        let session = create_test_session(&user_id);
        store.put_session(&session).unwrap();

        let a1 = AgentId::from_uuid(uuid::Uuid::new_v4());
        let a2 = AgentId::from_uuid(uuid::Uuid::new_v4());

        let taken = store.assign_agent(&session.session_id, &a1, "Deniz").unwrap();
        assert_eq!(taken.status, SessionStatus::Active);
        assert_eq!(taken.agent_id, Some(a1));
        assert_eq!(taken.agent_name.as_deref(), Some("Deniz"));

        // The loser of the race gets a conflict, and the winner sticks
        let result = store.assign_agent(&session.session_id, &a2, "Ece");
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        let current = store.get_session(&session.session_id).unwrap().unwrap();
        assert_eq!(current.agent_id, Some(a1));
    }

    #[test]
    fn assign_agent_missing_session() {
        let (store, _dir) = create_test_store();
        let agent_id = AgentId::from_uuid(uuid::Uuid::new_v4());

        let result = store.assign_agent(&SessionId::generate(), &agent_id, "Deniz");
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[test]
    fn close_session_idempotent() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::from_uuid(uuid::Uuid::new_v4());
        let session = create_test_session(&user_id);
        store.put_session(&session).unwrap();

        let notice = closing_notice(&session.session_id);
        let closed = store.close_session(&session.session_id, &notice).unwrap().unwrap();
        assert_eq!(closed.status, SessionStatus::Closed);
        let first_closed_at = closed.closed_at.unwrap();

        // Second close is a no-op and must not move closed_at
        let again = closing_notice(&session.session_id);
        assert!(store.close_session(&session.session_id, &again).unwrap().is_none());
        let current = store.get_session(&session.session_id).unwrap().unwrap();
        assert_eq!(current.closed_at, Some(first_closed_at));
    }

    #[test]
    fn close_appends_notice_exactly_once() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::from_uuid(uuid::Uuid::new_v4());
        let session = create_test_session(&user_id);
        store.put_session(&session).unwrap();

        let message = create_test_message(&session.session_id, "merhaba");
        store.append_message(&message).unwrap();

        let closed = store
            .close_session(&session.session_id, &closing_notice(&session.session_id))
            .unwrap()
            .unwrap();
        assert_eq!(closed.message_count, 2);

        // The losing close leaves no second notice in the transcript
        assert!(store
            .close_session(&session.session_id, &closing_notice(&session.session_id))
            .unwrap()
            .is_none());

        let messages = store.list_messages(&session.session_id).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].sender, Sender::Bot);
        assert_eq!(messages[1].text, "Sohbet sonlandırıldı.");
        assert_eq!(
            store
                .get_session(&session.session_id)
                .unwrap()
                .unwrap()
                .message_count,
            2
        );
    }

    #[test]
    fn find_open_session_for_user() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::from_uuid(uuid::Uuid::new_v4());
        let other_user = UserId::from_uuid(uuid::Uuid::new_v4());

        // A closed session does not count as open
        let old = create_test_session(&user_id);
        store.put_session(&old).unwrap();
        store
            .close_session(&old.session_id, &closing_notice(&old.session_id))
            .unwrap();
        assert!(store.find_open_session_for_user(&user_id).unwrap().is_none());

        let open = create_test_session(&user_id);
        store.put_session(&open).unwrap();

        let found = store.find_open_session_for_user(&user_id).unwrap().unwrap();
        assert_eq!(found.session_id, open.session_id);
        assert!(store
            .find_open_session_for_user(&other_user)
            .unwrap()
            .is_none());
    }

    #[test]
    fn messages_iterate_in_append_order() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::from_uuid(uuid::Uuid::new_v4());
        let session = create_test_session(&user_id);
        store.put_session(&session).unwrap();

        for i in 0..10 {
            let message = create_test_message(&session.session_id, &format!("mesaj {i}"));
            store.append_message(&message).unwrap();
        }

        let messages = store.list_messages(&session.session_id).unwrap();
        assert_eq!(messages.len(), 10);
        for (i, message) in messages.iter().enumerate() {
            assert_eq!(message.text, format!("mesaj {i}"));
        }

        let current = store.get_session(&session.session_id).unwrap().unwrap();
        assert_eq!(current.message_count, 10);
    }

    #[test]
    fn append_clamps_backwards_timestamps() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::from_uuid(uuid::Uuid::new_v4());
        let session = create_test_session(&user_id);
        store.put_session(&session).unwrap();

        let first = create_test_message(&session.session_id, "ilk");
        let first = store.append_message(&first).unwrap();

        let mut stale = create_test_message(&session.session_id, "geç");
        stale.timestamp = first.timestamp - Duration::seconds(30);
        let stored = store.append_message(&stale).unwrap();

        assert!(stored.timestamp >= first.timestamp);

        let messages = store.list_messages(&session.session_id).unwrap();
        assert!(messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn append_to_closed_session_conflicts() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::from_uuid(uuid::Uuid::new_v4());
        let session = create_test_session(&user_id);
        store.put_session(&session).unwrap();
        store
            .close_session(&session.session_id, &closing_notice(&session.session_id))
            .unwrap();

        let message = create_test_message(&session.session_id, "merhaba");
        let result = store.append_message(&message);
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[test]
    fn delete_session_removes_messages() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::from_uuid(uuid::Uuid::new_v4());
        let session = create_test_session(&user_id);
        store.put_session(&session).unwrap();

        for i in 0..3 {
            let message = create_test_message(&session.session_id, &format!("m{i}"));
            store.append_message(&message).unwrap();
        }

        store.delete_session(&session.session_id).unwrap();
        assert!(store.list_messages(&session.session_id).unwrap().is_empty());
    }

    #[test]
    fn list_open_sessions_spans_both_statuses() {
        let (store, _dir) = create_test_store();
        let u1 = UserId::from_uuid(uuid::Uuid::new_v4());
        let u2 = UserId::from_uuid(uuid::Uuid::new_v4());
        let u3 = UserId::from_uuid(uuid::Uuid::new_v4());

        let waiting = create_test_session(&u1);
        store.put_session(&waiting).unwrap();

        let taken = create_test_session(&u2);
        store.put_session(&taken).unwrap();
        let agent_id = AgentId::from_uuid(uuid::Uuid::new_v4());
        store
            .assign_agent(&taken.session_id, &agent_id, "Deniz")
            .unwrap();

        let closed = create_test_session(&u3);
        store.put_session(&closed).unwrap();
        store
            .close_session(&closed.session_id, &closing_notice(&closed.session_id))
            .unwrap();

        let open = store.list_open_sessions().unwrap();
        assert_eq!(open.len(), 2);
        assert!(open.iter().all(ChatSession::is_open));
    }
}
