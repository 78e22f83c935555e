//! Bearer credential access
//!
//! Login itself belongs to the dashboard. This module only exposes the
//! "current auth token" accessor the conversation client needs, and the hook
//! that runs when the backend answers 401.

use std::sync::Mutex;

use crate::config::AuthConfig;
use crate::error::{ChatError, Result};

/// Source of the bearer credential attached to every backend request
pub trait TokenSource: Send + Sync {
    /// The current token, or `None` when the user is signed out
    fn current_token(&self) -> Option<String>;

    /// Called when the backend rejects the credential
    fn on_unauthorized(&self) {}
}

/// Credential store backed by an environment variable and the OS keyring
///
/// The environment variable named by `auth.token_env` wins over the keyring
/// so CI and scripted runs never touch the credential store.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    token_env: String,
    keyring_service: String,
    keyring_user: String,
}

impl CredentialStore {
    /// Create a credential store from configuration
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            token_env: config.token_env.clone(),
            keyring_service: config.keyring_service.clone(),
            keyring_user: config.keyring_user.clone(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        let entry = keyring::Entry::new(&self.keyring_service, &self.keyring_user)
            .map_err(ChatError::Keyring)?;
        Ok(entry)
    }

    /// Store a bearer token in the keyring
    pub fn save_token(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ChatError::Unauthorized("refusing to store an empty token".into()).into());
        }
        self.entry()?
            .set_password(token)
            .map_err(ChatError::Keyring)?;
        tracing::info!("Stored credential in keyring service '{}'", self.keyring_service);
        Ok(())
    }

    /// Remove the stored bearer token; a missing entry is not an error
    pub fn delete_token(&self) -> Result<()> {
        match self.entry()?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ChatError::Keyring(e).into()),
        }
    }

    fn keyring_token(&self) -> Option<String> {
        let entry = match self.entry() {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Keyring unavailable: {}", e);
                return None;
            }
        };
        match entry.get_password() {
            Ok(token) if !token.trim().is_empty() => Some(token),
            Ok(_) | Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                tracing::warn!("Failed to read credential from keyring: {}", e);
                None
            }
        }
    }
}

impl TokenSource for CredentialStore {
    fn current_token(&self) -> Option<String> {
        if let Ok(token) = std::env::var(&self.token_env) {
            if !token.trim().is_empty() {
                return Some(token);
            }
        }
        self.keyring_token()
    }

    fn on_unauthorized(&self) {
        tracing::warn!(
            "Backend rejected the credential; run `sponsorchat login` to sign in again"
        );
    }
}

/// Fixed token source for tests and embedding
#[derive(Debug, Default)]
pub struct StaticTokenSource {
    token: Mutex<Option<String>>,
    rejections: Mutex<usize>,
}

impl StaticTokenSource {
    /// A source that always yields `token`
    ///
    /// # Examples
    ///
    /// ```
    /// use sponsorchat::auth::{StaticTokenSource, TokenSource};
    ///
    /// let source = StaticTokenSource::new("secret");
    /// assert_eq!(source.current_token().as_deref(), Some("secret"));
    /// ```
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
            rejections: Mutex::new(0),
        }
    }

    /// A source for a signed-out user
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Number of times the backend rejected the token
    pub fn rejections(&self) -> usize {
        *self.rejections.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenSource for StaticTokenSource {
    fn current_token(&self) -> Option<String> {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn on_unauthorized(&self) {
        *self.rejections.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }
}
