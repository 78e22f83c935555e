/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`     - Interactive chat on one surface
- `ask`      - One-shot quick message
- `auth`     - Store or remove the bearer credential
- `sessions` - Inspect and clear stored sessions

The handlers are thin: all session semantics live in
[`SessionController`](crate::session::SessionController).
*/

use crate::auth::{CredentialStore, TokenSource};
use crate::client::{ConversationClient, HttpConversationClient};
use crate::config::Config;
use crate::error::Result;
use crate::storage::SqliteSessionStore;
use std::sync::Arc;

// Special commands parser for the chat loop
pub mod special_commands;

// Stored session inspection
pub mod sessions;

/// Open the session store named by configuration, or the default location
pub fn open_store(config: &Config) -> Result<SqliteSessionStore> {
    match &config.storage.path {
        Some(path) => SqliteSessionStore::new_with_path(path),
        None => SqliteSessionStore::new(),
    }
}

/// Build the HTTP conversation client using the configured credential store
pub fn build_client(config: &Config) -> Result<Arc<dyn ConversationClient>> {
    let tokens: Arc<dyn TokenSource> = Arc::new(CredentialStore::new(&config.auth));
    let client = HttpConversationClient::new(&config.api, tokens)?;
    Ok(Arc::new(client))
}

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Mounts one surface's [`SessionController`], restores or creates its
    //! conversation, and runs a readline loop that sends each line and
    //! reveals the reply with the [`IncrementalRenderer`].

    use super::*;
    use crate::commands::sessions::print_message;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::session::{
        ChatAlert, IncrementalRenderer, InitOutcome, Message, SendOutcome, SessionController,
        SurfaceKind,
    };
    use crate::storage::SessionStore;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::io::Write;
    use std::time::Duration;

    /// Start interactive chat on a surface
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `surface` - Which chat surface to mount
    pub async fn run_chat(config: Config, surface: SurfaceKind) -> Result<()> {
        let store: Arc<dyn SessionStore> = Arc::new(open_store(&config)?);
        let client = build_client(&config)?;
        let controller = SessionController::new(
            config.surfaces.profile(surface).clone(),
            client,
            store,
        )
        .with_after_exhaustion(config.session.after_exhaustion);
        let mut renderer =
            IncrementalRenderer::new(Duration::from_millis(config.session.reveal_interval_ms));

        print_welcome_banner(&controller);
        report_init(&controller, controller.initialize().await);

        let mut rl = DefaultEditor::new()?;
        let prompt = format!("[{}] >> ", surface).cyan().to_string();

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::ShowStatus) => {
                            print_status_display(&controller);
                            continue;
                        }
                        Ok(SpecialCommand::ShowHistory) => {
                            println!();
                            print_timeline(&controller);
                            continue;
                        }
                        Ok(SpecialCommand::NewConversation) => {
                            renderer.cancel();
                            report_init(&controller, controller.reset().await);
                            continue;
                        }
                        Ok(SpecialCommand::Dismiss) => {
                            controller.dismiss_alert();
                            continue;
                        }
                        Ok(SpecialCommand::Logout) => {
                            renderer.cancel();
                            controller.logout();
                            println!("{}", "Session cleared. Goodbye!".yellow());
                            break;
                        }
                        Ok(SpecialCommand::Help) => {
                            print_help();
                            continue;
                        }
                        Ok(SpecialCommand::Exit) => break,
                        Ok(SpecialCommand::None) => {}
                        Err(e) => {
                            eprintln!("{}", e.to_string().red());
                            continue;
                        }
                    }

                    rl.add_history_entry(trimmed)?;

                    println!("{}", "assistant is typing...".dimmed());
                    match controller.send(trimmed).await {
                        SendOutcome::Committed(reply) => {
                            reveal_reply(&mut renderer, &reply).await;
                        }
                        SendOutcome::Failed(alert) => print_alert(&alert),
                        SendOutcome::Busy => {
                            println!("{}", "Still waiting for the previous reply.".yellow());
                        }
                        SendOutcome::Empty => {}
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("^D");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        renderer.cancel();
        println!("Goodbye!");
        Ok(())
    }

    /// Print the reply as the renderer reveals it
    ///
    /// Ctrl-C skips the animation; the committed reply is unaffected either way.
    async fn reveal_reply(renderer: &mut IncrementalRenderer, reply: &Message) {
        let mut rx = renderer.reveal(reply);
        let mut printed = 0usize;
        let mut stdout = std::io::stdout();
        print!("{} ", "assistant:".bold().green());

        loop {
            let frame = rx.borrow_and_update().clone();
            if frame.visible.len() > printed {
                print!("{}", &frame.visible[printed..]);
                let _ = stdout.flush();
                printed = frame.visible.len();
            }
            if frame.complete {
                break;
            }

            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    renderer.cancel();
                    break;
                }
            }
        }

        if printed < reply.content.len() {
            print!("{}", &reply.content[printed..]);
        }
        println!("\n");
    }

    fn report_init(controller: &SessionController, outcome: InitOutcome) {
        match outcome {
            InitOutcome::Restored => {
                let snapshot = controller.snapshot();
                println!(
                    "{}\n",
                    format!(
                        "Resumed conversation {} ({} messages)",
                        snapshot.conversation_id.as_deref().unwrap_or("-"),
                        snapshot.messages.len()
                    )
                    .green()
                );
                for message in &snapshot.messages {
                    print_message(message);
                }
                println!();
            }
            InitOutcome::Created => print_timeline(controller),
            InitOutcome::Replaced => {
                println!(
                    "{}",
                    "Your previous conversation expired; starting a new one.".yellow()
                );
                print_timeline(controller);
            }
            InitOutcome::Degraded(alert) => print_alert(&alert),
            InitOutcome::Busy => {
                println!("{}", "A request is already in progress.".yellow());
            }
        }
    }

    fn print_timeline(controller: &SessionController) {
        for message in controller.messages() {
            print_message(&message);
        }
        println!();
    }

    fn print_alert(alert: &ChatAlert) {
        eprintln!("{}", alert.banner().red().bold());
        if *alert == ChatAlert::Reauthenticate {
            eprintln!(
                "Run {} to sign in again.",
                "sponsorchat login --token <TOKEN>".cyan()
            );
        }
        println!();
    }

    fn print_welcome_banner(controller: &SessionController) {
        let profile = controller.profile();
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║               Sponsor Marketplace AI Chat                    ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Surface: {} ({})", profile.title.bold(), profile.mode);
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    /// Display the current session state for `/status`
    fn print_status_display(controller: &SessionController) {
        let snapshot = controller.snapshot();
        println!("\n{}", "Session Status".bold());
        println!("  Session:      {}", snapshot.session_name.cyan());
        println!(
            "  Conversation: {}",
            snapshot.conversation_id.as_deref().unwrap_or("-")
        );
        println!("  Phase:        {}", snapshot.phase.label());
        println!("  Messages:     {}", snapshot.messages.len());
        if let Some(pending) = &snapshot.pending {
            println!("  Pending:      attempt {}", pending.attempt.number());
        }
        match &snapshot.alert {
            Some(alert) => println!("  Alert:        {}", alert.banner().red()),
            None => println!("  Alert:        {}", "none".green()),
        }
        println!();
    }
}

// One-shot quick message handler
pub mod ask {
    use super::*;
    use colored::Colorize;

    /// Send a single quick message and print the reply
    ///
    /// Quick messages carry no conversation and are never stored.
    pub async fn run_ask(config: Config, message: String) -> Result<()> {
        let client = build_client(&config)?;
        let text = message.trim();
        if text.is_empty() {
            println!("{}", "Nothing to send.".yellow());
            return Ok(());
        }

        let reply = client.quick_message(text).await?;
        println!("{}", reply.content);
        Ok(())
    }
}

// Credential handlers
pub mod auth {
    use super::*;
    use crate::storage::SessionStore;
    use colored::Colorize;

    /// Store a bearer token in the OS keyring
    pub fn login(config: &Config, token: &str) -> Result<()> {
        CredentialStore::new(&config.auth).save_token(token)?;
        println!("{}", "Credential stored.".green());
        Ok(())
    }

    /// Remove the stored credential and every surface's session
    ///
    /// Logging out destroys chat sessions, so the sessions are cleared
    /// even if the keyring cannot be reached.
    pub fn logout(config: &Config) -> Result<()> {
        let store = open_store(config)?;
        clear_sessions(config, &store)?;

        if let Err(e) = CredentialStore::new(&config.auth).delete_token() {
            tracing::warn!("Failed to remove credential from keyring: {}", e);
            eprintln!("{}", format!("Could not remove the stored credential: {}", e).red());
        }
        println!("{}", "Logged out.".green());
        Ok(())
    }

    /// Clear the stored session of every configured surface
    pub fn clear_sessions(config: &Config, store: &dyn SessionStore) -> Result<()> {
        for profile in config.surfaces.all() {
            store.clear(&profile.session_name)?;
            tracing::info!("Cleared session '{}'", profile.session_name);
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::session::SessionRecord;
        use crate::storage::MemorySessionStore;

        #[test]
        fn test_clear_sessions_removes_every_surface() {
            let config = Config::default();
            let store = MemorySessionStore::new();
            store.save("agentic", &SessionRecord::greeting("a")).unwrap();
            store.save("widget", &SessionRecord::greeting("b")).unwrap();
            store.save("other", &SessionRecord::greeting("c")).unwrap();

            clear_sessions(&config, &store).unwrap();

            assert!(store.load("agentic").is_none());
            assert!(store.load("widget").is_none());
            assert!(store.load("other").is_some());
        }
    }
}
