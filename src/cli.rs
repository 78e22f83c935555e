//! Command-line interface definition for sponsorchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands to chat on a surface, send quick messages,
//! manage the credential, and inspect stored sessions.

use clap::{Parser, Subcommand};

use crate::session::SurfaceKind;

/// sponsorchat - AI chat for the sponsor marketplace dashboard
#[derive(Parser, Debug, Clone)]
#[command(name = "sponsorchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Override the backend API base URL
    #[arg(long)]
    pub api_base: Option<String>,

    /// Override the local session database path
    #[arg(long)]
    pub storage_path: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open an interactive chat on a surface
    Chat {
        /// Chat surface to mount (agentic, widget)
        #[arg(short, long, default_value = "agentic")]
        surface: SurfaceKind,
    },

    /// Send a one-shot message without a stored conversation
    Ask {
        /// Message text
        message: String,
    },

    /// Store the bearer credential in the OS keyring
    Login {
        /// Bearer token issued by the dashboard
        #[arg(long)]
        token: String,
    },

    /// Remove the stored credential and clear every surface's session
    Logout,

    /// Inspect or clear stored sessions
    Sessions {
        /// Session subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },
}

/// Stored session subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List stored sessions
    List,

    /// Print a stored session's timeline
    Show {
        /// Session name (e.g. agentic, widget)
        name: String,
    },

    /// Remove a stored session
    Clear {
        /// Session name (e.g. agentic, widget)
        name: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            api_base: None,
            storage_path: None,
            verbose: false,
            command: Commands::Sessions {
                command: SessionCommand::List,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_chat_with_surface() {
        let cli = Cli::try_parse_from(["sponsorchat", "chat", "--surface", "widget"]).unwrap();
        match cli.command {
            Commands::Chat { surface } => assert_eq!(surface, SurfaceKind::Widget),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_chat_defaults_to_agentic() {
        let cli = Cli::try_parse_from(["sponsorchat", "chat"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Chat {
                surface: SurfaceKind::Agentic
            }
        ));
    }

    #[test]
    fn test_parse_invalid_surface_fails() {
        assert!(Cli::try_parse_from(["sponsorchat", "chat", "--surface", "sidebar"]).is_err());
    }

    #[test]
    fn test_parse_global_overrides() {
        let cli = Cli::try_parse_from([
            "sponsorchat",
            "--api-base",
            "https://api.example.com",
            "--storage-path",
            "/tmp/s.db",
            "sessions",
            "show",
            "agentic",
        ])
        .unwrap();
        assert_eq!(cli.api_base.as_deref(), Some("https://api.example.com"));
        assert_eq!(cli.storage_path.as_deref(), Some("/tmp/s.db"));
        assert!(matches!(
            cli.command,
            Commands::Sessions {
                command: SessionCommand::Show { .. }
            }
        ));
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["sponsorchat", "ask", "hello there"]).unwrap();
        match cli.command {
            Commands::Ask { message } => assert_eq!(message, "hello there"),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
