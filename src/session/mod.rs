//! Conversation session management
//!
//! - [`types`]: messages, session records and the request phase
//! - [`surface`]: per-surface profiles (agentic panel, floating widget)
//! - [`recovery`]: the one-retry conversation recovery state machine
//! - [`controller`]: the owner of a surface's timeline
//! - [`reveal`]: the cosmetic character-by-character renderer
//! - [`metrics`]: send and recovery metrics

pub mod controller;
pub mod metrics;
pub mod recovery;
pub mod reveal;
pub mod surface;
pub mod types;

pub use controller::{InitOutcome, SendOutcome, SessionController, SessionSnapshot};
pub use recovery::{RecoveryCoordinator, RecoveryHooks};
pub use reveal::{IncrementalRenderer, RevealFrame};
pub use surface::{AfterExhaustion, SurfaceKind, SurfaceProfile};
pub use types::{
    new_message_id, Attempt, ChatAlert, Message, PendingSend, Role, SendPhase, SessionRecord,
};
