//! sponsorchat - conversation session manager for the marketplace AI chat
//!
//! This library backs the dashboard's two AI chat surfaces (the agentic
//! assistant panel and the floating chat widget). It keeps an append-only
//! message timeline consistent across memory, a local session store and the
//! backend's conversation records, and recovers transparently, once, when
//! the backend forgets a conversation.
//!
//! # Architecture
//!
//! - `storage`: local session store (SQLite, in-memory)
//! - `client`: conversation client (HTTP, in-process fake)
//! - `session`: session controller, recovery coordinator, incremental renderer
//! - `auth`: bearer credential access
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli` / `commands`: the terminal front-end
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sponsorchat::client::FakeConversationClient;
//! use sponsorchat::session::{SendOutcome, SessionController, SurfaceProfile};
//! use sponsorchat::storage::MemorySessionStore;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let controller = SessionController::new(
//!     SurfaceProfile::agentic(),
//!     Arc::new(FakeConversationClient::new()),
//!     Arc::new(MemorySessionStore::new()),
//! );
//! controller.initialize().await;
//! let outcome = controller.send("hello").await;
//! assert!(matches!(outcome, SendOutcome::Committed(_)));
//! assert_eq!(controller.messages().len(), 3);
//! # }
//! ```

pub mod auth;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use error::{ChatError, Result};
pub use session::{SendOutcome, SessionController};

#[cfg(test)]
pub mod test_utils;
