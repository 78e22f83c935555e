//! In-process fake backend for session tests
//!
//! [`FakeConversationClient`] behaves like a small, well-behaved backend:
//! created conversations exist, posting to an existing conversation returns
//! `"echo: <text>"`, and posting to an unknown one is a not-found. Tests can
//! override individual replies with a script, make conversations vanish,
//! and hold replies until released to observe a send in flight.
//!
//! ```
//! use sponsorchat::client::{ConversationClient, FakeConversationClient, FakeReply};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let client = FakeConversationClient::new();
//! let id = client.create_conversation("Assistant", "agentic").await.unwrap();
//! client.script_post(FakeReply::NotFound);
//!
//! assert!(client.post_message(&id, "hi").await.is_err());
//! assert_eq!(client.post_message(&id, "hi").await.unwrap().content, "echo: hi");
//! assert_eq!(client.post_calls(), 2);
//! # }
//! ```

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::client::ConversationClient;
use crate::error::{ChatError, ClientResult};
use crate::session::Message;

/// A scripted outcome for the next matching call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeReply {
    /// Succeed with an assistant message carrying this text
    Reply(String),
    /// Answer with a not-found
    NotFound,
    /// Fail with a transient backend error
    Unavailable,
    /// Reject the credential
    Unauthorized,
}

impl FakeReply {
    fn into_error(self, conversation_id: &str) -> Option<ChatError> {
        match self {
            FakeReply::Reply(_) => None,
            FakeReply::NotFound => Some(ChatError::ConversationNotFound(
                conversation_id.to_string(),
            )),
            FakeReply::Unavailable => Some(ChatError::BackendUnavailable(
                "fake backend unavailable".to_string(),
            )),
            FakeReply::Unauthorized => Some(ChatError::Unauthorized(
                "fake backend rejected credential".to_string(),
            )),
        }
    }
}

#[derive(Debug, Default)]
struct FakeState {
    next_id: usize,
    existing: HashSet<String>,
    created: Vec<(String, String)>,
    probes: Vec<String>,
    posts: Vec<(String, String)>,
    quick: Vec<String>,
    post_script: VecDeque<FakeReply>,
    create_script: VecDeque<FakeReply>,
    probe_script: VecDeque<FakeReply>,
    gate: Option<Arc<Semaphore>>,
}

/// Deterministic conversation backend kept in memory
#[derive(Debug, Default)]
pub struct FakeConversationClient {
    state: Mutex<FakeState>,
}

impl FakeConversationClient {
    /// Create an empty fake backend
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a conversation id as existing on the backend
    pub fn insert_conversation(&self, conversation_id: &str) {
        self.state().existing.insert(conversation_id.to_string());
    }

    /// Delete a conversation server-side
    pub fn forget_conversation(&self, conversation_id: &str) {
        self.state().existing.remove(conversation_id);
    }

    /// Queue the outcome of the next `post_message`
    pub fn script_post(&self, reply: FakeReply) {
        self.state().post_script.push_back(reply);
    }

    /// Queue the outcome of the next `create_conversation`
    ///
    /// `FakeReply::Reply(id)` forces the returned id.
    pub fn script_create(&self, reply: FakeReply) {
        self.state().create_script.push_back(reply);
    }

    /// Queue the outcome of the next `conversation_exists`
    ///
    /// `FakeReply::Reply(_)` answers `true`, `FakeReply::NotFound` answers
    /// `false`.
    pub fn script_probe(&self, reply: FakeReply) {
        self.state().probe_script.push_back(reply);
    }

    /// Hold every `post_message` until [`release_reply`](Self::release_reply)
    pub fn hold_replies(&self) {
        self.state().gate = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let one held `post_message` complete
    pub fn release_reply(&self) {
        if let Some(gate) = &self.state().gate {
            gate.add_permits(1);
        }
    }

    /// Number of `create_conversation` calls
    pub fn create_calls(&self) -> usize {
        self.state().created.len()
    }

    /// `(title, mode)` of every `create_conversation` call
    pub fn created(&self) -> Vec<(String, String)> {
        self.state().created.clone()
    }

    /// Number of `post_message` calls
    pub fn post_calls(&self) -> usize {
        self.state().posts.len()
    }

    /// `(conversation_id, text)` of every `post_message` call
    pub fn posts(&self) -> Vec<(String, String)> {
        self.state().posts.clone()
    }

    /// Conversation ids probed with `conversation_exists`
    pub fn probes(&self) -> Vec<String> {
        self.state().probes.clone()
    }

    /// Texts sent with `quick_message`
    pub fn quick_messages(&self) -> Vec<String> {
        self.state().quick.clone()
    }
}

#[async_trait]
impl ConversationClient for FakeConversationClient {
    async fn create_conversation(&self, title: &str, mode: &str) -> ClientResult<String> {
        let mut state = self.state();
        state.created.push((title.to_string(), mode.to_string()));
        state.next_id += 1;

        let id = match state.create_script.pop_front() {
            Some(FakeReply::Reply(id)) => id,
            Some(other) => {
                return Err(other
                    .into_error("")
                    .unwrap_or_else(|| ChatError::BackendUnavailable("create failed".into())))
            }
            None => format!("conv-{}", state.next_id),
        };
        state.existing.insert(id.clone());
        Ok(id)
    }

    async fn conversation_exists(&self, conversation_id: &str) -> ClientResult<bool> {
        let mut state = self.state();
        state.probes.push(conversation_id.to_string());
        match state.probe_script.pop_front() {
            Some(FakeReply::Reply(_)) => Ok(true),
            Some(FakeReply::NotFound) => Ok(false),
            Some(other) => Err(other
                .into_error(conversation_id)
                .unwrap_or_else(|| ChatError::BackendUnavailable("probe failed".into()))),
            None => Ok(state.existing.contains(conversation_id)),
        }
    }

    async fn post_message(&self, conversation_id: &str, text: &str) -> ClientResult<Message> {
        let (scripted, gate) = {
            let mut state = self.state();
            state
                .posts
                .push((conversation_id.to_string(), text.to_string()));
            (state.post_script.pop_front(), state.gate.clone())
        };

        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        match scripted {
            Some(FakeReply::Reply(content)) => Ok(Message::assistant(content)),
            Some(other) => Err(other
                .into_error(conversation_id)
                .unwrap_or_else(|| ChatError::BackendUnavailable("post failed".into()))),
            None => {
                if self.state().existing.contains(conversation_id) {
                    Ok(Message::assistant(format!("echo: {}", text)))
                } else {
                    Err(ChatError::ConversationNotFound(conversation_id.to_string()))
                }
            }
        }
    }

    async fn quick_message(&self, text: &str) -> ClientResult<Message> {
        self.state().quick.push(text.to_string());
        Ok(Message::assistant(format!("quick: {}", text)))
    }
}
