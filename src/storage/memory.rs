//! In-memory session store
//!
//! Keeps records as serialized JSON so that it exercises the same decode path
//! as the SQLite store. Used in tests and by callers that do not want
//! anything written to disk.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{ChatError, Result};
use crate::session::SessionRecord;
use crate::storage::{decode_record, SessionStore};

/// Session store backed by a process-local map
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw stored value, bypassing serialization
    ///
    /// # Examples
    ///
    /// ```
    /// use sponsorchat::storage::{MemorySessionStore, SessionStore};
    ///
    /// let store = MemorySessionStore::new();
    /// store.insert_raw("agentic", "{broken");
    /// assert!(store.load("agentic").is_none());
    /// ```
    pub fn insert_raw(&self, session_name: &str, raw: &str) {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(session_name.to_string(), raw.to_string());
    }

    /// Make every subsequent `save` fail, as a full quota would
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, session_name: &str) -> Option<SessionRecord> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        let raw = values.get(session_name)?;
        decode_record(session_name, raw)
    }

    fn save(&self, session_name: &str, record: &SessionRecord) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ChatError::Storage("storage quota exceeded".to_string()).into());
        }
        let raw = serde_json::to_string(record).map_err(ChatError::from)?;
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(session_name.to_string(), raw);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self, session_name: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.remove(session_name);
        Ok(())
    }
}
