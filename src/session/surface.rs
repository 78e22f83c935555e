//! Chat surface profiles
//!
//! The dashboard mounts two chat surfaces: the persistent agentic assistant
//! panel and the floating chat widget. Each surface owns one session record,
//! stored under its own session name, and creates conversations with its own
//! title and mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which chat surface a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    /// Persistent agentic assistant panel
    Agentic,
    /// Floating chat widget
    Widget,
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceKind::Agentic => write!(f, "agentic"),
            SurfaceKind::Widget => write!(f, "widget"),
        }
    }
}

impl FromStr for SurfaceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "agentic" | "assistant" | "panel" => Ok(SurfaceKind::Agentic),
            "widget" | "chat" => Ok(SurfaceKind::Widget),
            other => Err(format!(
                "Invalid surface: {}. Must be one of: agentic, widget",
                other
            )),
        }
    }
}

/// Per-surface session settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceProfile {
    /// Key of the session record in the local store
    pub session_name: String,
    /// Title sent when creating a conversation
    pub title: String,
    /// Mode sent when creating a conversation
    pub mode: String,
    /// Text of the synthetic greeting seeded into fresh timelines
    pub greeting: String,
}

impl SurfaceProfile {
    /// Default profile for the agentic assistant panel
    pub fn agentic() -> Self {
        Self {
            session_name: "agentic".to_string(),
            title: "AI Assistant".to_string(),
            mode: "agentic".to_string(),
            greeting: "Hi! I'm your campaign assistant. Ask me about sponsors, creators, \
                       or planning your next campaign."
                .to_string(),
        }
    }

    /// Default profile for the floating chat widget
    pub fn widget() -> Self {
        Self {
            session_name: "widget".to_string(),
            title: "Quick Chat".to_string(),
            mode: "chat".to_string(),
            greeting: "Hi there! How can I help you today?".to_string(),
        }
    }
}

/// What the next `send` does after recovery gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AfterExhaustion {
    /// Re-run initialization (probe or create) before sending
    #[default]
    Reinitialize,
    /// Send against the current conversation id as-is
    RetryInPlace,
}

impl FromStr for AfterExhaustion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reinitialize" => Ok(AfterExhaustion::Reinitialize),
            "retry_in_place" | "retry" => Ok(AfterExhaustion::RetryInPlace),
            other => Err(format!(
                "Invalid after_exhaustion policy: {}. Must be one of: reinitialize, retry_in_place",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_kind_parse() {
        assert_eq!("agentic".parse::<SurfaceKind>(), Ok(SurfaceKind::Agentic));
        assert_eq!("WIDGET".parse::<SurfaceKind>(), Ok(SurfaceKind::Widget));
        assert!("sidebar".parse::<SurfaceKind>().is_err());
    }

    #[test]
    fn test_default_profiles_use_distinct_sessions() {
        assert_ne!(
            SurfaceProfile::agentic().session_name,
            SurfaceProfile::widget().session_name
        );
    }

    #[test]
    fn test_after_exhaustion_parse() {
        assert_eq!(
            "retry".parse::<AfterExhaustion>(),
            Ok(AfterExhaustion::RetryInPlace)
        );
        assert_eq!(
            "Reinitialize".parse::<AfterExhaustion>(),
            Ok(AfterExhaustion::Reinitialize)
        );
        assert!("never".parse::<AfterExhaustion>().is_err());
    }
}
