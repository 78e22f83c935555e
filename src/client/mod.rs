//! Conversation client
//!
//! Translates session operations into backend calls. Implementations own no
//! session state; every call is independent.
//!
//! - [`http::HttpConversationClient`] talks to the dashboard backend.
//! - [`fake::FakeConversationClient`] is a deterministic in-process backend
//!   for tests.

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::session::Message;

pub mod fake;
pub mod http;
mod wire;

pub use fake::{FakeConversationClient, FakeReply};
pub use http::HttpConversationClient;

/// Backend operations used by the chat surfaces
///
/// Errors follow the backend taxonomy in [`crate::error::ChatError`]:
/// `Unauthorized`, `BackendUnavailable`, and, for `post_message` only,
/// `ConversationNotFound`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationClient: Send + Sync {
    /// Create a conversation and return its id
    async fn create_conversation(&self, title: &str, mode: &str) -> ClientResult<String>;

    /// Probe whether a conversation still exists
    ///
    /// A not-found answer is `Ok(false)`; only transport and auth failures
    /// are errors.
    async fn conversation_exists(&self, conversation_id: &str) -> ClientResult<bool>;

    /// Post user text to a conversation and return the assistant reply
    async fn post_message(&self, conversation_id: &str, text: &str) -> ClientResult<Message>;

    /// One-shot message that does not touch any stored conversation
    async fn quick_message(&self, text: &str) -> ClientResult<Message>;
}
