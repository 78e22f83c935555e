use crate::cli::SessionCommand;
use crate::error::Result;
use crate::session::{Message, Role};
use crate::storage::{SessionStore, SqliteSessionStore};
use colored::Colorize;
use prettytable::{format, Table};

/// Handle stored session commands
pub fn handle_sessions(store: &SqliteSessionStore, command: SessionCommand) -> Result<()> {
    match command {
        SessionCommand::List => {
            let sessions = store.list_sessions()?;

            if sessions.is_empty() {
                println!("{}", "No stored sessions found.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "Session".bold(),
                "Conversation".bold(),
                "Messages".bold(),
                "Last Updated".bold()
            ]);

            for session in sessions {
                let conversation = session
                    .conversation_id
                    .unwrap_or_else(|| "-".to_string());
                let updated = session.updated_at.format("%Y-%m-%d %H:%M").to_string();

                table.add_row(prettytable::row![
                    session.name.cyan(),
                    conversation,
                    session.message_count,
                    updated
                ]);
            }

            println!("\nStored Sessions:");
            table.printstd();
            println!();
            println!(
                "Use {} to resume a session.",
                "sponsorchat chat --surface <SESSION>".cyan()
            );
            println!();
        }
        SessionCommand::Show { name } => match store.load(&name) {
            Some(record) => {
                let conversation = record.conversation_id.as_deref().unwrap_or("-");
                println!(
                    "\nSession {} (conversation {})\n",
                    name.cyan(),
                    conversation
                );
                for message in &record.messages {
                    print_message(message);
                }
                println!();
            }
            None => {
                println!("{}", format!("No stored session named '{}'.", name).yellow());
            }
        },
        SessionCommand::Clear { name } => {
            store.clear(&name)?;
            println!("{}", format!("Cleared session {}", name).green());
        }
    }

    Ok(())
}

/// Print one timeline entry with a role tag and timestamp
pub fn print_message(message: &Message) {
    let time = message.created_at.format("%H:%M").to_string().dimmed();
    let tag = match message.role {
        Role::User => "you".bold().blue(),
        Role::Assistant => "assistant".bold().green(),
    };
    println!("{} {}: {}", time, tag, message.content);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionRecord;
    use crate::test_utils::temp_store as store;

    #[test]
    fn test_list_empty_store() {
        let (store, _tmp) = store();
        assert!(handle_sessions(&store, SessionCommand::List).is_ok());
    }

    #[test]
    fn test_show_missing_session_is_not_an_error() {
        let (store, _tmp) = store();
        let result = handle_sessions(
            &store,
            SessionCommand::Show {
                name: "agentic".to_string(),
            },
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_clear_removes_record() {
        let (store, _tmp) = store();
        let mut record = SessionRecord::greeting("hi");
        record.conversation_id = Some("conv-1".to_string());
        store.save("widget", &record).unwrap();

        handle_sessions(
            &store,
            SessionCommand::Clear {
                name: "widget".to_string(),
            },
        )
        .unwrap();
        assert!(store.load("widget").is_none());
    }
}
