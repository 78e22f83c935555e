//! Error types for sponsorchat
//!
//! This module defines the error taxonomy used by the conversation client,
//! the recovery coordinator, and the ambient configuration and storage
//! layers, using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Stage at which conversation recovery gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStage {
    /// The replacement conversation could not be created
    Recreate,
    /// The resend against the replacement conversation reported not-found again
    Resend,
}

impl std::fmt::Display for RecoveryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveryStage::Recreate => write!(f, "recreate"),
            RecoveryStage::Resend => write!(f, "resend"),
        }
    }
}

/// Main error type for sponsorchat operations
///
/// The first four variants form the backend taxonomy the session controller
/// reasons about. The remaining variants cover configuration, storage and
/// credential handling.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Missing or rejected bearer credential (never retried)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend no longer knows the conversation
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    /// Transient network or server failure
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Conversation recovery ran out of its single retry
    #[error("Session could not be restored (stage={stage})")]
    RecoveryExhausted {
        /// Where the recovery gave up
        stage: RecoveryStage,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local session storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ChatError {
    /// Returns true for the not-found kind handled by recovery
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChatError::ConversationNotFound(_))
    }
}

/// Result type alias for sponsorchat application code
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Result type for conversation client calls
///
/// Client calls keep the concrete [`ChatError`] so that callers can match on
/// the backend taxonomy.
pub type ClientResult<T> = std::result::Result<T, ChatError>;
