//! Conversation recovery for a single user send
//!
//! Conversation ids go stale: they expire, get deleted server-side, or were
//! never committed before an earlier navigation. When a post reports
//! not-found, the coordinator creates a replacement conversation and resends
//! the pending user text once. The budget is exactly one recovery per send:
//!
//! ```text
//! Sending(First) --ok--> Committed
//!       | not-found
//!       v
//!   Recovering --create fails--> Failed(SessionLost(Recreate))
//!       | created
//!       v
//! Sending(Second) --ok--> Committed
//!       | not-found
//!       v
//! Failed(SessionLost(Resend))
//! ```
//!
//! Any other error in either sending state fails the attempt immediately.
//! The coordinator never touches the timeline itself; it reports phase
//! changes and the rebind to the controller through [`RecoveryHooks`].

use crate::client::ConversationClient;
use crate::error::{ChatError, RecoveryStage};
use crate::session::types::{Attempt, ChatAlert, Message, PendingSend, SendPhase};

/// Callbacks through which the controller observes and applies recovery
pub trait RecoveryHooks: Send {
    /// The attempt entered a new phase
    fn on_phase(&mut self, phase: SendPhase);

    /// A replacement conversation was created
    ///
    /// Called before the second attempt is posted, so the rebound record is
    /// persisted before the retry can be observed by the backend.
    fn on_rebound(&mut self, conversation_id: &str, pending: &PendingSend);
}

/// Map a client error from a sending state to the visible alert
pub fn alert_for(error: &ChatError) -> ChatAlert {
    match error {
        ChatError::Unauthorized(_) => ChatAlert::Reauthenticate,
        ChatError::RecoveryExhausted { stage } => ChatAlert::SessionLost(*stage),
        ChatError::ConversationNotFound(_) => ChatAlert::SessionLost(RecoveryStage::Resend),
        other => ChatAlert::Unavailable(other.to_string()),
    }
}

fn exhausted(stage: RecoveryStage) -> ChatAlert {
    alert_for(&ChatError::RecoveryExhausted { stage })
}

/// Drives the Sending / Recovering state machine for one send
pub struct RecoveryCoordinator<'a> {
    client: &'a dyn ConversationClient,
    title: &'a str,
    mode: &'a str,
}

impl<'a> RecoveryCoordinator<'a> {
    /// Create a coordinator that recreates conversations with `title` and `mode`
    pub fn new(client: &'a dyn ConversationClient, title: &'a str, mode: &'a str) -> Self {
        Self {
            client,
            title,
            mode,
        }
    }

    /// Run the attempt to a terminal state
    ///
    /// Returns the assistant reply on **Committed**, or the alert describing
    /// **Failed**. The caller publishes the terminal phase.
    pub async fn run<H: RecoveryHooks>(
        &self,
        conversation_id: &str,
        mut pending: PendingSend,
        hooks: &mut H,
    ) -> Result<Message, ChatAlert> {
        let mut conversation_id = conversation_id.to_string();

        loop {
            hooks.on_phase(SendPhase::Sending {
                attempt: pending.attempt,
            });
            tracing::debug!(
                "Posting to conversation {} (attempt {})",
                conversation_id,
                pending.attempt.number()
            );

            let error = match self
                .client
                .post_message(&conversation_id, pending.user_text())
                .await
            {
                Ok(reply) => return Ok(reply),
                Err(e) => e,
            };

            match (error, pending.attempt) {
                (ChatError::ConversationNotFound(_), Attempt::First) => {
                    tracing::warn!(
                        "Conversation {} not found, creating a replacement",
                        conversation_id
                    );
                    hooks.on_phase(SendPhase::Recovering);

                    match self.client.create_conversation(self.title, self.mode).await {
                        Ok(new_id) => {
                            tracing::info!(
                                "Replaced conversation {} with {}",
                                conversation_id,
                                new_id
                            );
                            hooks.on_rebound(&new_id, &pending);
                            conversation_id = new_id;
                            pending.attempt = Attempt::Second;
                        }
                        Err(ChatError::Unauthorized(reason)) => {
                            tracing::warn!("Recovery rejected credential: {}", reason);
                            return Err(ChatAlert::Reauthenticate);
                        }
                        Err(e) => {
                            tracing::error!("Could not re-establish the session: {}", e);
                            return Err(exhausted(RecoveryStage::Recreate));
                        }
                    }
                }
                (ChatError::ConversationNotFound(_), Attempt::Second) => {
                    tracing::error!(
                        "Replacement conversation {} was not found either, giving up",
                        conversation_id
                    );
                    return Err(exhausted(RecoveryStage::Resend));
                }
                (other, attempt) => {
                    tracing::warn!("Send attempt {} failed: {}", attempt.number(), other);
                    return Err(alert_for(&other));
                }
            }
        }
    }
}
