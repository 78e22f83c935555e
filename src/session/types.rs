//! Timeline data model shared by the store, the client and the controller
//!
//! Messages are ordered by append order only. `created_at` is informational;
//! client and server clocks may disagree, so nothing sequences on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::RecoveryStage;

/// Author of a timeline message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the user
    User,
    /// Reply produced by the assistant (including the synthetic greeting)
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single immutable timeline entry
///
/// # Examples
///
/// ```
/// use sponsorchat::session::{Message, Role};
///
/// let message = Message::user("hello");
/// assert_eq!(message.role, Role::User);
/// assert_eq!(message.content, "hello");
/// assert!(!message.id.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque identifier, unique within a session
    pub id: String,
    /// Message author
    pub role: Role,
    /// Message text
    pub content: String,
    /// Creation time as reported by whoever created the message
    #[serde(alias = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message with a fresh local id
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Create a user message with a fresh local id
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message with a fresh local id
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Generate a fresh local message id
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The durable state of one chat surface
///
/// Serialized as `{"conversationId": ..., "messages": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Backend conversation id, `None` until a conversation is established
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Timeline in append order
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl SessionRecord {
    /// A record seeded with only the synthetic greeting
    ///
    /// # Examples
    ///
    /// ```
    /// use sponsorchat::session::SessionRecord;
    ///
    /// let record = SessionRecord::greeting("Hi there!");
    /// assert!(record.conversation_id.is_none());
    /// assert_eq!(record.messages.len(), 1);
    /// assert!(record.is_consistent());
    /// ```
    pub fn greeting(text: &str) -> Self {
        Self {
            conversation_id: None,
            messages: vec![Message::assistant(text)],
        }
    }

    /// Check the record invariants
    ///
    /// Without a conversation id the timeline holds at most the greeting,
    /// and message ids are unique.
    pub fn is_consistent(&self) -> bool {
        if self.conversation_id.is_none() && self.messages.len() > 1 {
            return false;
        }
        if matches!(&self.conversation_id, Some(id) if id.is_empty()) {
            return false;
        }
        let mut seen = HashSet::with_capacity(self.messages.len());
        self.messages.iter().all(|m| seen.insert(m.id.as_str()))
    }

    /// Returns true if a message with `id` is already in the timeline
    pub fn contains_id(&self, id: &str) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }
}

/// Which of the two allowed post attempts is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// Initial post against the current conversation
    First,
    /// The single retry against a freshly recreated conversation
    Second,
}

impl Attempt {
    /// Attempt number, 1 or 2
    pub fn number(self) -> u8 {
        match self {
            Attempt::First => 1,
            Attempt::Second => 2,
        }
    }
}

/// Transient state for the send currently in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    /// The optimistic user message already on the timeline
    pub user_message: Message,
    /// Current attempt
    pub attempt: Attempt,
}

impl PendingSend {
    /// Start a pending send for a freshly appended user message
    pub fn new(user_message: Message) -> Self {
        Self {
            user_message,
            attempt: Attempt::First,
        }
    }

    /// The text being sent
    pub fn user_text(&self) -> &str {
        &self.user_message.content
    }
}

/// Visible error state the front-end renders instead of raw errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAlert {
    /// The credential is missing or was rejected; the user must sign in again
    Reauthenticate,
    /// Transient backend failure; the user may retry manually
    Unavailable(String),
    /// The conversation was lost and the single recovery failed
    SessionLost(RecoveryStage),
}

impl ChatAlert {
    /// User-facing banner text
    pub fn banner(&self) -> String {
        match self {
            ChatAlert::Reauthenticate => "Your sign-in has expired. Please log in again.".to_string(),
            ChatAlert::Unavailable(detail) => {
                format!("The assistant is unavailable right now ({detail}). Please try again.")
            }
            ChatAlert::SessionLost(_) => {
                "Your chat session could not be restored. Reload to start a new session."
                    .to_string()
            }
        }
    }
}

impl fmt::Display for ChatAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.banner())
    }
}

/// Request state of a session
///
/// `Initializing`, `Sending` and `Recovering` are busy; `Committed` and
/// `Failed` are terminal for the attempt that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SendPhase {
    /// Nothing has been sent yet
    #[default]
    Idle,
    /// Establishing or verifying the backend conversation
    Initializing,
    /// A post is in flight
    Sending {
        /// Which attempt is running
        attempt: Attempt,
    },
    /// Creating a replacement conversation after a not-found
    Recovering,
    /// The last send produced an assistant reply
    Committed,
    /// The last send or initialization failed
    Failed(ChatAlert),
}

impl SendPhase {
    /// Returns true while a request owns the session
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SendPhase::Initializing | SendPhase::Sending { .. } | SendPhase::Recovering
        )
    }

    /// Short label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            SendPhase::Idle => "idle",
            SendPhase::Initializing => "initializing",
            SendPhase::Sending { .. } => "sending",
            SendPhase::Recovering => "recovering",
            SendPhase::Committed => "committed",
            SendPhase::Failed(_) => "failed",
        }
    }
}
