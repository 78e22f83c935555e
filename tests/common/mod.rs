use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use sponsorchat::client::FakeConversationClient;
use sponsorchat::session::{SessionController, SurfaceProfile};
use sponsorchat::storage::{SessionStore, SqliteSessionStore};

#[allow(dead_code)]
pub fn create_temp_store() -> (SqliteSessionStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("sessions.db");
    let store =
        SqliteSessionStore::new_with_path(db_path).expect("failed to create session store with path");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn controller_with(
    profile: SurfaceProfile,
    client: &Arc<FakeConversationClient>,
    store: Arc<dyn SessionStore>,
) -> SessionController {
    SessionController::new(profile, client.clone(), store)
}
