//! Session controller
//!
//! The controller is the only component that mutates a surface's timeline.
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`; the only suspension points are the conversation client calls.
//! The busy check and the phase change that claims the session therefore
//! happen in one critical section, which is what makes "at most one send in
//! flight" hold even when several tasks share the controller.
//!
//! Every timeline mutation is followed by a store write inside the same
//! critical section, so the store never runs ahead of memory.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::client::ConversationClient;
use crate::session::metrics;
use crate::session::recovery::{alert_for, RecoveryCoordinator, RecoveryHooks};
use crate::session::surface::{AfterExhaustion, SurfaceProfile};
use crate::session::types::{
    new_message_id, ChatAlert, Message, PendingSend, SendPhase, SessionRecord,
};
use crate::storage::SessionStore;

/// Result of [`SessionController::initialize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// A stored record was found and its conversation still exists
    Restored,
    /// No usable record was stored; a fresh conversation was created
    Created,
    /// The stored conversation was gone; it was replaced with a fresh one
    Replaced,
    /// The backend could not be reached; the session will retry on the next send
    Degraded(ChatAlert),
    /// A request already owns the session
    Busy,
}

impl InitOutcome {
    fn label(&self) -> &'static str {
        match self {
            InitOutcome::Restored => "restored",
            InitOutcome::Created => "created",
            InitOutcome::Replaced => "replaced",
            InitOutcome::Degraded(_) => "degraded",
            InitOutcome::Busy => "busy",
        }
    }
}

/// Result of [`SessionController::send`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The assistant reply was appended to the timeline
    Committed(Message),
    /// Another request is in flight; nothing was appended
    Busy,
    /// The text was empty after trimming; nothing was appended
    Empty,
    /// The send failed; the user message stays on the timeline
    Failed(ChatAlert),
}

impl SendOutcome {
    fn label(&self) -> &'static str {
        match self {
            SendOutcome::Committed(_) => "committed",
            SendOutcome::Busy => "busy",
            SendOutcome::Empty => "empty",
            SendOutcome::Failed(_) => "failed",
        }
    }
}

/// Point-in-time copy of a session for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Session name in the local store
    pub session_name: String,
    /// Backend conversation id, if established
    pub conversation_id: Option<String>,
    /// Timeline in append order
    pub messages: Vec<Message>,
    /// Current request phase
    pub phase: SendPhase,
    /// Visible error, if any
    pub alert: Option<ChatAlert>,
    /// Send in flight, if any
    pub pending: Option<PendingSend>,
}

#[derive(Debug, Default)]
struct SessionState {
    record: SessionRecord,
    phase: SendPhase,
    pending: Option<PendingSend>,
    alert: Option<ChatAlert>,
    needs_init: bool,
    // Bumped by logout so that a request started before it cannot write back.
    generation: u64,
}

/// Owner of one chat surface's timeline
pub struct SessionController {
    profile: SurfaceProfile,
    after_exhaustion: AfterExhaustion,
    client: Arc<dyn ConversationClient>,
    store: Arc<dyn SessionStore>,
    state: Mutex<SessionState>,
}

impl SessionController {
    /// Create a controller for a surface
    ///
    /// Nothing is loaded until [`initialize`](Self::initialize) runs.
    pub fn new(
        profile: SurfaceProfile,
        client: Arc<dyn ConversationClient>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let state = SessionState {
            needs_init: true,
            ..SessionState::default()
        };
        Self {
            profile,
            after_exhaustion: AfterExhaustion::default(),
            client,
            store,
            state: Mutex::new(state),
        }
    }

    /// Choose what the next send does after recovery gave up
    pub fn with_after_exhaustion(mut self, policy: AfterExhaustion) -> Self {
        self.after_exhaustion = policy;
        self
    }

    /// Surface profile this controller serves
    pub fn profile(&self) -> &SurfaceProfile {
        &self.profile
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, state: &SessionState) {
        if let Err(e) = self.store.save(&self.profile.session_name, &state.record) {
            tracing::warn!(
                "Failed to persist session '{}': {}",
                self.profile.session_name,
                e
            );
        }
    }

    fn greeting(&self) -> Message {
        Message::assistant(self.profile.greeting.clone())
    }

    /// Load or establish the session
    ///
    /// A stored conversation id is only adopted after the backend confirms
    /// it still exists. Otherwise a fresh conversation is created and the
    /// timeline starts over with the greeting.
    pub async fn initialize(&self) -> InitOutcome {
        let generation = {
            let mut state = self.lock();
            if state.phase.is_busy() {
                return InitOutcome::Busy;
            }
            state.phase = SendPhase::Initializing;
            state.generation
        };

        let outcome = self.establish(generation).await;

        let mut state = self.lock();
        if state.generation == generation {
            state.phase = match &outcome {
                InitOutcome::Degraded(alert) => SendPhase::Failed(alert.clone()),
                _ => SendPhase::Idle,
            };
        }
        outcome
    }

    /// Network half of initialization; the caller has claimed the session
    async fn establish(&self, generation: u64) -> InitOutcome {
        let name = &self.profile.session_name;
        let loaded = self.store.load(name);

        let outcome = match loaded {
            Some(record) => match record.conversation_id.clone() {
                Some(conversation_id) => match self.client.conversation_exists(&conversation_id).await {
                    Ok(true) => {
                        tracing::info!(
                            "Restored session '{}' on conversation {} ({} messages)",
                            name,
                            conversation_id,
                            record.messages.len()
                        );
                        let mut state = self.lock();
                        if state.generation == generation {
                            state.record = record;
                            state.needs_init = false;
                            state.alert = None;
                        }
                        InitOutcome::Restored
                    }
                    Ok(false) => {
                        tracing::info!(
                            "Stored conversation {} for '{}' has expired, starting over",
                            conversation_id,
                            name
                        );
                        self.start_fresh(generation, InitOutcome::Replaced).await
                    }
                    Err(e) => {
                        tracing::warn!("Could not verify conversation {}: {}", conversation_id, e);
                        let alert = alert_for(&e);
                        let mut state = self.lock();
                        if state.generation == generation {
                            state.record = record;
                            state.needs_init = true;
                            state.alert = Some(alert.clone());
                        }
                        InitOutcome::Degraded(alert)
                    }
                },
                None => self.start_fresh(generation, InitOutcome::Created).await,
            },
            None => self.start_fresh(generation, InitOutcome::Created).await,
        };

        metrics::record_initialization(name, outcome.label());
        outcome
    }

    async fn start_fresh(&self, generation: u64, success: InitOutcome) -> InitOutcome {
        let created = self
            .client
            .create_conversation(&self.profile.title, &self.profile.mode)
            .await;

        let mut state = self.lock();
        if state.generation != generation {
            return success;
        }
        match created {
            Ok(conversation_id) => {
                state.record = SessionRecord {
                    conversation_id: Some(conversation_id),
                    messages: vec![self.greeting()],
                };
                state.needs_init = false;
                state.alert = None;
                self.persist(&state);
                success
            }
            Err(e) => {
                tracing::warn!(
                    "Could not create a conversation for '{}': {}",
                    self.profile.session_name,
                    e
                );
                let alert = alert_for(&e);
                state.record = SessionRecord {
                    conversation_id: None,
                    messages: vec![self.greeting()],
                };
                state.needs_init = true;
                state.alert = Some(alert.clone());
                self.persist(&state);
                InitOutcome::Degraded(alert)
            }
        }
    }

    /// Send user text and wait for the terminal outcome
    ///
    /// The user message is appended and persisted before any network call
    /// and is kept on failure so the user can retry by hand.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let started = Instant::now();
        let outcome = self.send_inner(text.trim()).await;
        if !matches!(outcome, SendOutcome::Busy | SendOutcome::Empty) {
            metrics::record_send(&self.profile.session_name, outcome.label(), started.elapsed());
        }
        outcome
    }

    async fn send_inner(&self, text: &str) -> SendOutcome {
        let (generation, needs_init) = {
            let mut state = self.lock();
            if state.phase.is_busy() {
                tracing::debug!("Rejected send on '{}': busy", self.profile.session_name);
                return SendOutcome::Busy;
            }
            if text.is_empty() {
                return SendOutcome::Empty;
            }
            let needs_init = state.needs_init || state.record.conversation_id.is_none();
            state.phase = SendPhase::Initializing;
            (state.generation, needs_init)
        };

        if needs_init {
            if let InitOutcome::Degraded(alert) = self.establish(generation).await {
                let mut state = self.lock();
                if state.generation == generation {
                    state.phase = SendPhase::Failed(alert.clone());
                }
                return SendOutcome::Failed(alert);
            }
        }

        let (conversation_id, pending) = {
            let mut state = self.lock();
            if state.generation != generation {
                return SendOutcome::Failed(ChatAlert::Reauthenticate);
            }
            let Some(conversation_id) = state.record.conversation_id.clone() else {
                let alert = ChatAlert::Unavailable("no conversation is established".to_string());
                state.needs_init = true;
                state.phase = SendPhase::Failed(alert.clone());
                return SendOutcome::Failed(alert);
            };

            let user_message = Message::user(text);
            state.record.messages.push(user_message.clone());
            let pending = PendingSend::new(user_message);
            state.pending = Some(pending.clone());
            state.phase = SendPhase::Sending {
                attempt: pending.attempt,
            };
            self.persist(&state);
            (conversation_id, pending)
        };

        let coordinator =
            RecoveryCoordinator::new(self.client.as_ref(), &self.profile.title, &self.profile.mode);
        let mut hooks = ControllerHooks {
            controller: self,
            generation,
        };
        let result = coordinator.run(&conversation_id, pending, &mut hooks).await;

        self.finish(generation, result)
    }

    fn finish(&self, generation: u64, result: Result<Message, ChatAlert>) -> SendOutcome {
        let mut state = self.lock();
        if state.generation != generation {
            tracing::info!(
                "Discarding reply for '{}': session was cleared while sending",
                self.profile.session_name
            );
            drop(result);
            return SendOutcome::Failed(ChatAlert::Reauthenticate);
        }
        state.pending = None;

        match result {
            Ok(mut reply) => {
                if reply.id.is_empty() || state.record.contains_id(&reply.id) {
                    reply.id = new_message_id();
                }
                state.record.messages.push(reply.clone());
                state.phase = SendPhase::Committed;
                state.alert = None;
                self.persist(&state);
                SendOutcome::Committed(reply)
            }
            Err(alert) => {
                tracing::error!(
                    "Send on '{}' failed: {}",
                    self.profile.session_name,
                    alert
                );
                if requires_reload(&alert) {
                    metrics::record_recovery(&self.profile.session_name, "failed");
                    // The stored record is destroyed; memory keeps the user message.
                    if let Err(e) = self.store.clear(&self.profile.session_name) {
                        tracing::warn!(
                            "Failed to clear session '{}': {}",
                            self.profile.session_name,
                            e
                        );
                    }
                    if self.after_exhaustion == AfterExhaustion::Reinitialize {
                        state.needs_init = true;
                    }
                }
                state.phase = SendPhase::Failed(alert.clone());
                state.alert = Some(alert.clone());
                SendOutcome::Failed(alert)
            }
        }
    }

    fn rebind(&self, generation: u64, conversation_id: &str, pending: &PendingSend) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }
        state.record = SessionRecord {
            conversation_id: Some(conversation_id.to_string()),
            messages: vec![self.greeting(), pending.user_message.clone()],
        };
        state.needs_init = false;
        self.persist(&state);
        metrics::record_recovery(&self.profile.session_name, "rebound");
    }

    /// Copy of the current session state
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            session_name: self.profile.session_name.clone(),
            conversation_id: state.record.conversation_id.clone(),
            messages: state.record.messages.clone(),
            phase: state.phase.clone(),
            alert: state.alert.clone(),
            pending: state.pending.clone(),
        }
    }

    /// Timeline in append order
    pub fn messages(&self) -> Vec<Message> {
        self.lock().record.messages.clone()
    }

    /// Backend conversation id, if established
    pub fn conversation_id(&self) -> Option<String> {
        self.lock().record.conversation_id.clone()
    }

    /// True while a request owns the session
    pub fn is_busy(&self) -> bool {
        self.lock().phase.is_busy()
    }

    /// Clear the visible alert
    pub fn dismiss_alert(&self) {
        self.lock().alert = None;
    }

    /// Destroy the session on explicit logout
    ///
    /// The stored record is removed and the in-memory timeline emptied. A
    /// send still in flight completes against the backend but its result is
    /// not written back.
    pub fn logout(&self) {
        let mut state = self.lock();
        if let Err(e) = self.store.clear(&self.profile.session_name) {
            tracing::warn!(
                "Failed to clear session '{}': {}",
                self.profile.session_name,
                e
            );
        }
        state.generation += 1;
        state.record = SessionRecord::default();
        state.phase = SendPhase::Idle;
        state.pending = None;
        state.alert = None;
        state.needs_init = true;
        tracing::info!("Cleared session '{}'", self.profile.session_name);
    }

    /// Start over with a fresh conversation
    pub async fn reset(&self) -> InitOutcome {
        if self.is_busy() {
            return InitOutcome::Busy;
        }
        self.logout();
        self.initialize().await
    }
}

struct ControllerHooks<'a> {
    controller: &'a SessionController,
    generation: u64,
}

impl RecoveryHooks for ControllerHooks<'_> {
    fn on_phase(&mut self, phase: SendPhase) {
        let mut state = self.controller.lock();
        if state.generation != self.generation {
            return;
        }
        if let (SendPhase::Sending { attempt }, Some(pending)) = (&phase, state.pending.as_mut()) {
            pending.attempt = *attempt;
        }
        state.phase = phase;
    }

    fn on_rebound(&mut self, conversation_id: &str, pending: &PendingSend) {
        self.controller
            .rebind(self.generation, conversation_id, pending);
    }
}

/// Returns true if an alert means the session must be rebuilt by a reload
pub fn requires_reload(alert: &ChatAlert) -> bool {
    matches!(alert, ChatAlert::SessionLost(_))
}
