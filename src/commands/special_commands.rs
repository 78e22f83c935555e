//! Special commands parser for interactive chat mode
//!
//! Special commands control the session instead of being sent to the
//! assistant. They are prefixed with `/` and are case-insensitive; `exit`
//! and `quit` also work without the slash.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command does not take an argument but was given one
    #[error("{command} does not take an argument (got '{arg}')\n\nType '/help' to see valid usage")]
    UnexpectedArgument { command: String, arg: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Show the conversation id, phase, alert and message count
    ShowStatus,

    /// Reprint the whole timeline
    ShowHistory,

    /// Discard the session and start a fresh conversation
    NewConversation,

    /// Hide the current error banner
    Dismiss,

    /// Clear this surface's session and end the chat
    Logout,

    /// Display help information
    Help,

    /// Exit the interactive session; the session is kept for next time
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the assistant.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` for an unrecognised `/command` and
/// `CommandError::UnexpectedArgument` when a command is given trailing text.
///
/// # Examples
///
/// ```
/// use sponsorchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewConversation);
/// assert_eq!(parse_special_command("QUIT").unwrap(), SpecialCommand::Exit);
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let mut parts = lower.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    let parsed = match command {
        "/status" => SpecialCommand::ShowStatus,
        "/history" => SpecialCommand::ShowHistory,
        "/new" | "/reset" => SpecialCommand::NewConversation,
        "/dismiss" => SpecialCommand::Dismiss,
        "/logout" => SpecialCommand::Logout,
        "/help" | "/?" => SpecialCommand::Help,
        "/exit" | "/quit" => SpecialCommand::Exit,
        _ => return Err(CommandError::UnknownCommand(trimmed.to_string())),
    };

    if !arg.is_empty() {
        return Err(CommandError::UnexpectedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        });
    }

    Ok(parsed)
}

/// Print help for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

SESSION INFORMATION:
  /status         - Show conversation, request phase and message count
  /history        - Reprint the whole conversation
  /help           - Show this help message
  /?              - Same as /help

SESSION CONTROL:
  /new            - Start a fresh conversation (also /reset)
  /dismiss        - Hide the current error banner
  /logout         - Forget this surface's session and leave
  exit            - Exit interactive mode; the session is kept
  quit            - Same as exit

NOTES:
  - Commands are case-insensitive
  - Regular text (not starting with /) is sent to the assistant
  - A message that failed stays in the conversation; send it again to retry
"#
    );
}
