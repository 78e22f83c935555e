//! Local session store
//!
//! Holds at most one serialized [`SessionRecord`] per chat surface, keyed by
//! a logical session name. Reads never fail: anything that cannot be read or
//! parsed, or that violates the record invariants, is treated as absent.

use crate::error::{ChatError, Result};
use crate::session::SessionRecord;
use anyhow::Context;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

pub mod memory;
pub mod types;
pub use memory::MemorySessionStore;
pub use types::StoredSession;

/// Durable storage for chat surface session records
///
/// The session controller owns a handle to a store and is the only writer for
/// its session name.
pub trait SessionStore: Send + Sync {
    /// Load the record for `session_name`, or `None` if absent or unusable
    fn load(&self, session_name: &str) -> Option<SessionRecord>;

    /// Overwrite the record for `session_name`
    fn save(&self, session_name: &str, record: &SessionRecord) -> Result<()>;

    /// Remove the record for `session_name`; removing nothing is not an error
    fn clear(&self, session_name: &str) -> Result<()>;
}

/// Decode a stored JSON value, rejecting records that break invariants
pub(crate) fn decode_record(session_name: &str, raw: &str) -> Option<SessionRecord> {
    match serde_json::from_str::<SessionRecord>(raw) {
        Ok(record) if record.is_consistent() => Some(record),
        Ok(_) => {
            tracing::warn!(
                "Stored session '{}' violates record invariants, ignoring it",
                session_name
            );
            None
        }
        Err(e) => {
            tracing::warn!("Stored session '{}' is malformed: {}", session_name, e);
            None
        }
    }
}

/// SQLite-backed session store
pub struct SqliteSessionStore {
    db_path: PathBuf,
}

impl SqliteSessionStore {
    /// Create a store in the user's data directory
    ///
    /// The path can be overridden with `SPONSORCHAT_STORAGE_PATH`.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("SPONSORCHAT_STORAGE_PATH") {
            return Self::new_with_path(override_path);
        }

        Self::new_with_path(default_db_path()?)
    }

    /// Create a store that uses the specified database path.
    ///
    /// # Examples
    ///
    /// ```
    /// use sponsorchat::storage::{SessionStore, SqliteSessionStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SqliteSessionStore::new_with_path(dir.path().join("sessions.db")).unwrap();
    /// assert!(store.load("agentic").is_none());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create parent directory for database")
                    .map_err(|e| ChatError::Storage(e.to_string()))?;
            }
        }

        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    /// Path of the backing database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| ChatError::Storage(e.to_string()))?;
        Ok(conn)
    }

    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                name TEXT PRIMARY KEY,
                conversation_id TEXT,
                record JSON NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| ChatError::Storage(e.to_string()))?;

        Ok(())
    }

    fn load_raw(&self, session_name: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        let raw = conn
            .query_row(
                "SELECT record FROM sessions WHERE name = ?",
                params![session_name],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .context("Failed to query session")
            .map_err(|e| ChatError::Storage(e.to_string()))?;
        Ok(raw)
    }

    /// List all stored sessions, most recently updated first
    pub fn list_sessions(&self) -> Result<Vec<StoredSession>> {
        let conn = self.open()?;

        let mut stmt = conn
            .prepare(
                "SELECT name, conversation_id, record, updated_at
                FROM sessions
                ORDER BY updated_at DESC",
            )
            .context("Failed to prepare statement")
            .map_err(|e| ChatError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let name: String = row.get(0)?;
                let conversation_id: Option<String> = row.get(1)?;
                let record_json: String = row.get(2)?;
                let updated_at_str: String = row.get(3)?;

                let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now());

                let message_count = serde_json::from_str::<serde_json::Value>(&record_json)
                    .ok()
                    .and_then(|v| v.get("messages").and_then(|m| m.as_array()).map(Vec::len))
                    .unwrap_or(0);

                Ok(StoredSession {
                    name,
                    conversation_id,
                    updated_at,
                    message_count,
                })
            })
            .context("Failed to query sessions")
            .map_err(|e| ChatError::Storage(e.to_string()))?;

        Ok(rows.flatten().collect())
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self, session_name: &str) -> Option<SessionRecord> {
        match self.load_raw(session_name) {
            Ok(Some(raw)) => decode_record(session_name, &raw),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read session '{}': {}", session_name, e);
                None
            }
        }
    }

    fn save(&self, session_name: &str, record: &SessionRecord) -> Result<()> {
        let mut conn = self.open()?;

        let record_json = serde_json::to_string(record)
            .context("Failed to serialize session record")
            .map_err(|e| ChatError::Storage(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        // Single upsert inside a transaction, so a reader sees the old or the
        // new record and never a mix.
        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| ChatError::Storage(e.to_string()))?;

        tx.execute(
            "INSERT INTO sessions (name, conversation_id, record, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(name) DO UPDATE SET
                conversation_id = excluded.conversation_id,
                record = excluded.record,
                updated_at = excluded.updated_at",
            params![session_name, record.conversation_id, record_json, now],
        )
        .context("Failed to write session")
        .map_err(|e| ChatError::Storage(e.to_string()))?;

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| ChatError::Storage(e.to_string()))?;

        tracing::debug!(
            "Saved session '{}' ({} messages)",
            session_name,
            record.messages.len()
        );
        Ok(())
    }

    fn clear(&self, session_name: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute("DELETE FROM sessions WHERE name = ?", params![session_name])
            .context("Failed to delete session")
            .map_err(|e| ChatError::Storage(e.to_string()))?;
        Ok(())
    }
}

/// Default database location inside the platform data directory
fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "sponsordesk", "sponsorchat")
        .ok_or_else(|| ChatError::Storage("Could not determine data directory".into()))?;
    Ok(proj_dirs.data_dir().join("sessions.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Message;
    use serial_test::serial;
    use std::env;
    use tempfile::tempdir;

    fn create_test_store() -> (SqliteSessionStore, tempfile::TempDir) {
        let dir = tempdir().expect("failed to create tempdir");
        let store = SqliteSessionStore::new_with_path(dir.path().join("sessions.db"))
            .expect("failed to create store");
        (store, dir)
    }

    fn sample_record() -> SessionRecord {
        SessionRecord {
            conversation_id: Some("conv-1".to_string()),
            messages: vec![Message::assistant("Hi!"), Message::user("hello")],
        }
    }

    #[test]
    fn test_init_creates_table() {
        let (store, _dir) = create_test_store();
        let conn = Connection::open(store.db_path()).expect("open connection");
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='sessions'",
                [],
                |r| r.get(0),
            )
            .expect("query row");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_load_missing_session_is_absent() {
        let (store, _dir) = create_test_store();
        assert!(store.load("agentic").is_none());
    }

    #[test]
    fn test_save_then_load_returns_same_record() {
        let (store, _dir) = create_test_store();
        let record = sample_record();
        store.save("agentic", &record).expect("save failed");
        assert_eq!(store.load("agentic"), Some(record));
    }

    #[test]
    fn test_save_overwrites_previous_record() {
        let (store, _dir) = create_test_store();
        store.save("agentic", &sample_record()).expect("save failed");

        let replacement = SessionRecord {
            conversation_id: Some("conv-2".to_string()),
            messages: vec![Message::assistant("fresh")],
        };
        store.save("agentic", &replacement).expect("save failed");

        assert_eq!(store.load("agentic"), Some(replacement));
        assert_eq!(store.list_sessions().unwrap().len(), 1);
    }

    #[test]
    fn test_sessions_are_isolated_by_name() {
        let (store, _dir) = create_test_store();
        store.save("agentic", &sample_record()).expect("save failed");
        assert!(store.load("widget").is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (store, _dir) = create_test_store();
        store.save("agentic", &sample_record()).expect("save failed");
        store.clear("agentic").expect("first clear failed");
        store.clear("agentic").expect("second clear failed");
        assert!(store.load("agentic").is_none());
    }

    #[test]
    fn test_malformed_value_is_treated_as_absent() {
        let (store, _dir) = create_test_store();
        let conn = Connection::open(store.db_path()).unwrap();
        conn.execute(
            "INSERT INTO sessions (name, conversation_id, record, updated_at) VALUES (?, NULL, ?, ?)",
            params!["agentic", "{not json", Utc::now().to_rfc3339()],
        )
        .unwrap();

        assert!(store.load("agentic").is_none());
    }

    #[test]
    fn test_inconsistent_record_is_treated_as_absent() {
        let (store, _dir) = create_test_store();
        let record = SessionRecord {
            conversation_id: None,
            messages: vec![Message::assistant("Hi!"), Message::user("orphan")],
        };
        store.save("agentic", &record).expect("save failed");
        assert!(store.load("agentic").is_none());
    }

    #[test]
    fn test_list_sessions_reports_message_counts() {
        let (store, _dir) = create_test_store();
        store.save("agentic", &sample_record()).unwrap();
        store
            .save("widget", &SessionRecord::greeting("Hello"))
            .unwrap();

        let mut sessions = store.list_sessions().unwrap();
        sessions.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].name, "agentic");
        assert_eq!(sessions[0].conversation_id.as_deref(), Some("conv-1"));
        assert_eq!(sessions[0].message_count, 2);
        assert_eq!(sessions[1].message_count, 1);
        assert!(sessions[1].conversation_id.is_none());
    }

    #[test]
    #[serial]
    fn test_new_respects_env_override() {
        let dir = tempdir().expect("failed to create tempdir");
        let db_path = dir.path().join("nested").join("sessions.db");
        env::set_var("SPONSORCHAT_STORAGE_PATH", db_path.to_string_lossy().to_string());

        let store = SqliteSessionStore::new().expect("new failed with env override");
        assert_eq!(store.db_path(), db_path.as_path());
        assert!(db_path.parent().unwrap().exists());

        env::remove_var("SPONSORCHAT_STORAGE_PATH");
    }
}
