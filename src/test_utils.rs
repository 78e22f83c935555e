//! Test utilities for sponsorchat
//!
//! Shared fixtures: temporary SQLite stores and controllers wired to the
//! in-process fake client.

use crate::client::FakeConversationClient;
use crate::session::{SessionController, SurfaceProfile};
use crate::storage::{MemorySessionStore, SqliteSessionStore};
use std::sync::Arc;
use tempfile::TempDir;

/// Create a SQLite session store in a temporary directory
///
/// The directory is removed when the returned `TempDir` is dropped, so keep
/// it alive for as long as the store is used.
pub fn temp_store() -> (SqliteSessionStore, TempDir) {
    let dir = TempDir::new().expect("Failed to create temporary directory");
    let store = SqliteSessionStore::new_with_path(dir.path().join("sessions.db"))
        .expect("Failed to create session store");
    (store, dir)
}

/// Controller for `profile` backed by a fake client and an in-memory store
pub fn fake_controller(
    profile: SurfaceProfile,
) -> (
    SessionController,
    Arc<FakeConversationClient>,
    Arc<MemorySessionStore>,
) {
    let client = Arc::new(FakeConversationClient::new());
    let store = Arc::new(MemorySessionStore::new());
    let controller = SessionController::new(profile, client.clone(), store.clone());
    (controller, client, store)
}

/// Assert that an error's display text contains `expected`
pub fn assert_error_contains<E: std::fmt::Display>(err: E, expected: &str) {
    let message = err.to_string();
    assert!(
        message.contains(expected),
        "Expected error to contain '{}', got '{}'",
        expected,
        message
    );
}
