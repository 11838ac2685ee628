use crate::cli::SessionCommand;
use crate::client::models::ChatSession;
use crate::client::sessions::{NextSession, SessionStore};
use crate::client::{i18n, AuthSession};
use crate::config::Config;
use crate::error::{is_unauthorized, Result};
use colored::Colorize;
use prettytable::{format, Table};

use super::{api_client, open_store};

/// Handle `sessions` subcommands
pub async fn handle_sessions(config: Config, command: SessionCommand) -> Result<()> {
    let local = open_store(&config)?;
    let auth = AuthSession::new(local.clone());
    let Some(token) = auth.token() else {
        println!("{}", "Not logged in. Run `bankchat login` first.".yellow());
        return Ok(());
    };

    let api = api_client(&config)?;
    let mut store = SessionStore::new(api, local);
    if let Err(e) = store.load(&token).await {
        if is_unauthorized(&e) {
            println!("{}", "Session expired. Run `bankchat login` again.".yellow());
            return Ok(());
        }
        return Err(e);
    }
    if let Some(id) = store.stored_current_id() {
        store.select(&id);
    }

    match command {
        SessionCommand::List => {
            let sessions = store.sessions_by_recency();
            if sessions.is_empty() {
                println!("{}", "No chat sessions found.".yellow());
                return Ok(());
            }

            println!("\nChat Sessions:");
            print_sessions_table(&sessions, store.current_id());
            println!();
            println!(
                "Use {} to continue the current session.",
                "bankchat chat".cyan()
            );
            println!();
        }
        SessionCommand::Delete { id } => {
            if store.get(&id).is_none() {
                println!(
                    "{} ({})",
                    i18n::delete_failed(config.client.language).yellow(),
                    id
                );
                return Ok(());
            }
            let title = i18n::new_chat_title(config.client.language);
            let outcome = store.delete(Some(&token), &id, title).await;
            println!("{}", format!("Deleted session {}", id).green());
            match outcome.next {
                NextSession::Unchanged => {}
                NextSession::Switched(next) => println!("Current session is now {}", next.cyan()),
                NextSession::Created(next) => println!("Started new session {}", next.cyan()),
            }
            if outcome.remote_unauthorized {
                println!(
                    "{}",
                    "Removed locally only; the server rejected the token. Run `bankchat login` again."
                        .yellow()
                );
            }
        }
    }

    Ok(())
}

/// Print sessions as a table; the current one is starred
pub fn print_sessions_table(sessions: &[&ChatSession], current_id: Option<&str>) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "".bold(),
        "ID".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Last Updated".bold()
    ]);

    for session in sessions {
        let marker = if Some(session.id.as_str()) == current_id {
            "*"
        } else {
            ""
        };
        let title = if session.title.chars().count() > 40 {
            format!("{}...", session.title.chars().take(37).collect::<String>())
        } else {
            session.title.clone()
        };
        let updated = session.updated_at.format("%Y-%m-%d %H:%M").to_string();

        table.add_row(prettytable::row![
            marker.green(),
            session.id.cyan(),
            title,
            session.messages.len(),
            updated
        ]);
    }

    table.printstd();
}
