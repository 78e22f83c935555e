//! Incremental renderer
//!
//! Reveals an already committed assistant message a character at a time.
//! The renderer only reads the message it is given; cancelling or dropping
//! it mid-reveal leaves the timeline untouched. Starting a new reveal
//! cancels the previous one, so only the most recent reply animates.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::session::types::{Message, Role};

/// What is currently visible of the message being revealed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RevealFrame {
    /// Id of the message being revealed
    pub message_id: String,
    /// Visible prefix, always on a char boundary
    pub visible: String,
    /// True once the whole message is visible
    pub complete: bool,
}

struct ActiveReveal {
    message_id: String,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

/// Cosmetic character-by-character reveal of assistant replies
///
/// Must be used from within a tokio runtime.
pub struct IncrementalRenderer {
    cadence: Duration,
    active: Option<ActiveReveal>,
}

impl IncrementalRenderer {
    /// Create a renderer that reveals one character per `cadence`
    pub fn new(cadence: Duration) -> Self {
        Self {
            cadence,
            active: None,
        }
    }

    /// Start revealing `message`, cancelling any reveal in progress
    ///
    /// User messages, empty messages, and a zero cadence publish the complete
    /// text at once.
    pub fn reveal(&mut self, message: &Message) -> watch::Receiver<RevealFrame> {
        self.cancel();

        let (tx, rx) = watch::channel(RevealFrame {
            message_id: message.id.clone(),
            visible: String::new(),
            complete: false,
        });

        let cancel = CancellationToken::new();
        if message.role != Role::Assistant || message.content.is_empty() || self.cadence.is_zero()
        {
            let _ = tx.send(RevealFrame {
                message_id: message.id.clone(),
                visible: message.content.clone(),
                complete: true,
            });
            self.active = Some(ActiveReveal {
                message_id: message.id.clone(),
                cancel,
                task: None,
            });
            return rx;
        }

        let token = cancel.clone();
        let cadence = self.cadence;
        let message_id = message.id.clone();
        let content = message.content.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cadence);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let total = content.chars().count();
            let mut visible = String::with_capacity(content.len());

            for (shown, ch) in content.chars().enumerate() {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    _ = ticker.tick() => {}
                }
                visible.push(ch);
                let frame = RevealFrame {
                    message_id: message_id.clone(),
                    visible: visible.clone(),
                    complete: shown + 1 == total,
                };
                if tx.send(frame).is_err() {
                    // Every receiver is gone; nobody is watching.
                    return;
                }
            }
        });

        self.active = Some(ActiveReveal {
            message_id: message.id.clone(),
            cancel,
            task: Some(task),
        });
        rx
    }

    /// Stop the reveal in progress, if any
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            tracing::trace!("Cancelled reveal of message {}", active.message_id);
        }
    }

    /// Id of the message most recently handed to [`reveal`](Self::reveal)
    pub fn active_message_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.message_id.as_str())
    }

    /// True while a reveal task is still running
    pub fn is_revealing(&self) -> bool {
        self.active
            .as_ref()
            .and_then(|a| a.task.as_ref())
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for IncrementalRenderer {
    fn drop(&mut self) {
        self.cancel();
    }
}
