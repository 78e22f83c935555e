use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one stored chat surface session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    /// Logical session name (one per chat surface)
    pub name: String,
    /// Backend conversation the session is bound to, if any
    pub conversation_id: Option<String>,
    /// When the record was last written
    pub updated_at: DateTime<Utc>,
    /// Number of messages in the stored timeline
    pub message_count: usize,
}
