//! Configuration management for sponsorchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Precedence is file, then environment, then command-line flags.

use crate::error::{ChatError, Result};
use crate::session::{AfterExhaustion, SurfaceKind, SurfaceProfile};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Credential lookup settings
    #[serde(default)]
    pub auth: AuthConfig,
    /// Local session store settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Session behavior settings
    #[serde(default)]
    pub session: SessionConfig,
    /// Chat surface profiles
    #[serde(default)]
    pub surfaces: SurfacesConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the conversation endpoints are relative to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Credential lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable checked before the keyring
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Keyring service name
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Keyring user name
    #[serde(default = "default_keyring_user")]
    pub keyring_user: String,
}

fn default_token_env() -> String {
    "SPONSORCHAT_TOKEN".to_string()
}

fn default_keyring_service() -> String {
    "sponsorchat".to_string()
}

fn default_keyring_user() -> String {
    "default".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            keyring_service: default_keyring_service(),
            keyring_user: default_keyring_user(),
        }
    }
}

/// Local session store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Database path; the platform data directory is used when unset
    #[serde(default)]
    pub path: Option<String>,
}

/// Session behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Delay between revealed characters (milliseconds)
    #[serde(default = "default_reveal_interval_ms")]
    pub reveal_interval_ms: u64,

    /// What the next send does after the single recovery failed
    #[serde(default)]
    pub after_exhaustion: AfterExhaustion,
}

fn default_reveal_interval_ms() -> u64 {
    15
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reveal_interval_ms: default_reveal_interval_ms(),
            after_exhaustion: AfterExhaustion::default(),
        }
    }
}

/// Profiles for the two chat surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfacesConfig {
    /// Persistent agentic assistant panel
    #[serde(default = "default_agentic_surface")]
    pub agentic: SurfaceProfile,

    /// Floating chat widget
    #[serde(default = "default_widget_surface")]
    pub widget: SurfaceProfile,
}

fn default_agentic_surface() -> SurfaceProfile {
    SurfaceProfile::agentic()
}

fn default_widget_surface() -> SurfaceProfile {
    SurfaceProfile::widget()
}

impl Default for SurfacesConfig {
    fn default() -> Self {
        Self {
            agentic: default_agentic_surface(),
            widget: default_widget_surface(),
        }
    }
}

impl SurfacesConfig {
    /// Profile for a surface kind
    pub fn profile(&self, kind: SurfaceKind) -> &SurfaceProfile {
        match kind {
            SurfaceKind::Agentic => &self.agentic,
            SurfaceKind::Widget => &self.widget,
        }
    }

    /// All configured profiles
    pub fn all(&self) -> [&SurfaceProfile; 2] {
        [&self.agentic, &self.widget]
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string
    ///
    /// A blank document yields the defaults.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
            .map_err(|e| ChatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("SPONSORCHAT_API_BASE_URL") {
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("SPONSORCHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_seconds = value;
            } else {
                tracing::warn!("Ignoring invalid SPONSORCHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(path) = std::env::var("SPONSORCHAT_STORAGE_PATH") {
            self.storage.path = Some(path);
        }

        if let Ok(interval) = std::env::var("SPONSORCHAT_REVEAL_INTERVAL_MS") {
            if let Ok(value) = interval.parse() {
                self.session.reveal_interval_ms = value;
            } else {
                tracing::warn!("Ignoring invalid SPONSORCHAT_REVEAL_INTERVAL_MS: {}", interval);
            }
        }

        if let Ok(policy) = std::env::var("SPONSORCHAT_AFTER_EXHAUSTION") {
            match policy.parse::<AfterExhaustion>() {
                Ok(value) => self.session.after_exhaustion = value,
                Err(e) => tracing::warn!("Ignoring SPONSORCHAT_AFTER_EXHAUSTION: {}", e),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.api_base {
            self.api.base_url = base_url.clone();
        }
        if let Some(path) = &cli.storage_path {
            self.storage.path = Some(path.clone());
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api.base_url).map_err(|e| {
            ChatError::Config(format!("Invalid api.base_url '{}': {}", self.api.base_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ChatError::Config(format!(
                "api.base_url must use http or https, got '{}'",
                url.scheme()
            ))
            .into());
        }

        if self.api.timeout_seconds == 0 {
            return Err(ChatError::Config(
                "api.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.reveal_interval_ms > 1000 {
            return Err(ChatError::Config(
                "session.reveal_interval_ms must be less than or equal to 1000".to_string(),
            )
            .into());
        }

        if self.auth.token_env.trim().is_empty() {
            return Err(ChatError::Config("auth.token_env cannot be empty".to_string()).into());
        }

        for profile in self.surfaces.all() {
            if profile.session_name.trim().is_empty() {
                return Err(ChatError::Config(
                    "surface session_name cannot be empty".to_string(),
                )
                .into());
            }
            if profile.title.trim().is_empty() || profile.mode.trim().is_empty() {
                return Err(ChatError::Config(format!(
                    "surface '{}' needs a title and a mode",
                    profile.session_name
                ))
                .into());
            }
        }

        if self.surfaces.agentic.session_name == self.surfaces.widget.session_name {
            return Err(ChatError::Config(format!(
                "surfaces must use distinct session names, both use '{}'",
                self.surfaces.agentic.session_name
            ))
            .into());
        }

        Ok(())
    }
}
