/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `serve`    - Run the API proxy
- `auth`     - Log in and out
- `chat`     - Interactive chat and one-shot summaries
- `sessions` - List and delete chat sessions
*/

use crate::client::ApiClient;
use crate::config::Config;
use crate::error::Result;
use crate::storage::{LocalStore, SqliteStorage};
use std::sync::Arc;

// Special commands parser for the chat REPL
pub mod special_commands;

// Session listing and deletion
pub mod sessions;

/// Open the persisted client store at the configured location
pub(crate) fn open_store(config: &Config) -> Result<Arc<dyn LocalStore>> {
    let storage = SqliteStorage::open(config.client.storage_path.as_deref())?;
    tracing::debug!("Using client store at {}", storage.path().display());
    Ok(Arc::new(storage))
}

pub(crate) fn api_client(config: &Config) -> Result<Arc<ApiClient>> {
    Ok(Arc::new(ApiClient::new(
        &config.client.api_base,
        config.client.request_timeout_seconds,
    )?))
}

// Proxy server command handler
pub mod serve {
    //! Runs the API proxy until Ctrl-C.

    use super::*;
    use crate::error::BankchatError;
    use crate::proxy::ProxyServer;
    use colored::Colorize;
    use std::net::SocketAddr;

    /// Start the proxy and block until interrupted
    ///
    /// `listen` and `backend_url` override the configured values.
    pub async fn run_serve(
        mut config: Config,
        listen: Option<String>,
        backend_url: Option<String>,
    ) -> Result<()> {
        if let Some(listen) = listen {
            config.server.listen_addr = listen;
        }
        if let Some(url) = backend_url {
            config.server.backend_url = url;
        }
        config.validate()?;

        let addr: SocketAddr = config.server.listen_addr.parse().map_err(|e| {
            BankchatError::Config(format!(
                "Invalid listen address {}: {}",
                config.server.listen_addr, e
            ))
        })?;

        let mut server = ProxyServer::new(&config.server)?;
        let bound = server.start(addr).await?;
        println!(
            "{} {} -> {}",
            "Proxy listening on".green(),
            format!("http://{}", bound).cyan(),
            config.server.backend_url
        );

        tokio::signal::ctrl_c().await?;
        println!("Shutting down");
        server.stop().await?;
        Ok(())
    }
}

// Login/logout command handlers
pub mod auth {
    //! Stores or clears the bearer token used by the chat client.

    use super::*;
    use crate::client::AuthSession;
    use colored::Colorize;
    use rustyline::DefaultEditor;

    /// Log in; the password is prompted for when not supplied
    pub async fn login(config: Config, username: String, password: Option<String>) -> Result<()> {
        let password = match password {
            Some(p) => p,
            None => {
                let mut rl = DefaultEditor::new()?;
                rl.readline("Password: ")?
            }
        };

        let local = open_store(&config)?;
        let api = api_client(&config)?;
        let auth = AuthSession::new(local);
        let user = auth.login(&api, &username, &password).await?;

        println!(
            "{} {} ({})",
            "Logged in as".green(),
            user.username.cyan(),
            if user.role.is_empty() {
                "user"
            } else {
                user.role.as_str()
            }
        );
        Ok(())
    }

    pub fn logout(config: Config) -> Result<()> {
        let local = open_store(&config)?;
        let route = AuthSession::new(local).logout()?;
        tracing::debug!("Navigating to {}", route);
        println!("{}", "Logged out.".green());
        Ok(())
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Builds a [`ChatController`] over the proxy API and the local store and
    //! runs a readline loop; `/` commands drive sessions, feedback and
    //! attachments, other input is sent to the assistant.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::client::{i18n, Attachment, ChatController, Language, Message, Outcome};
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    fn build_controller(config: &Config, language: Option<String>) -> Result<ChatController> {
        let language = match language {
            Some(raw) => raw
                .parse::<Language>()
                .map_err(crate::error::BankchatError::Validation)?,
            None => config.client.language,
        };
        let local = open_store(config)?;
        let api = api_client(config)?;
        Ok(ChatController::new(api.clone(), api, local, language))
    }

    fn print_login_hint() {
        println!(
            "{}",
            "Not logged in or session expired. Run `bankchat login` first.".yellow()
        );
    }

    /// Start interactive chat mode
    pub async fn run_chat(config: Config, language: Option<String>) -> Result<()> {
        let mut chat = build_controller(&config, language)?;
        if let Outcome::Redirect(_) = chat.init().await {
            print_login_hint();
            return Ok(());
        }

        let mut rl = DefaultEditor::new()?;
        print_welcome_banner(&chat);

        loop {
            let prompt = format_prompt(&chat);
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() && chat.attachment().is_none() {
                        continue;
                    }

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            println!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    if !trimmed.is_empty() {
                        rl.add_history_entry(trimmed)?;
                    }

                    let outcome = match command {
                        SpecialCommand::None => {
                            let before = chat.messages().len();
                            let outcome = chat.send(trimmed).await;
                            print_new_messages(&chat, before);
                            outcome
                        }
                        SpecialCommand::Exit => break,
                        SpecialCommand::Help => {
                            print_help();
                            Outcome::Done
                        }
                        SpecialCommand::Logout => {
                            chat.logout()?;
                            println!("{}", "Logged out.".green());
                            break;
                        }
                        other => handle_command(&mut chat, other).await,
                    };

                    match outcome {
                        Outcome::Redirect(_) => {
                            print_login_hint();
                            break;
                        }
                        Outcome::Rejected => println!("{}", "Nothing to do.".dimmed()),
                        Outcome::Done | Outcome::Failed => {}
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Summarize the current session and print it
    pub async fn run_summary(config: Config) -> Result<()> {
        let mut chat = build_controller(&config, None)?;
        if let Outcome::Redirect(_) = chat.init().await {
            print_login_hint();
            return Ok(());
        }
        match chat.summarize().await {
            Outcome::Done => println!("\n{}\n", chat.summary_panel().text),
            Outcome::Redirect(_) => print_login_hint(),
            _ => println!("{}", "The current session has no messages.".yellow()),
        }
        Ok(())
    }

    /// Resolve a 1-based displayed message number to its id
    fn message_id(chat: &ChatController, number: usize) -> Option<String> {
        chat.visible_messages()
            .get(number.checked_sub(1)?)
            .map(|m| m.id.clone())
    }

    async fn handle_command(chat: &mut ChatController, command: SpecialCommand) -> Outcome {
        match command {
            SpecialCommand::NewSession => {
                let outcome = chat.new_session().await;
                if outcome == Outcome::Done {
                    println!("{}\n", "Started a new chat.".green());
                    print_suggestions(chat);
                }
                outcome
            }
            SpecialCommand::ListSessions => {
                let sessions = chat.sessions().sessions_by_recency();
                super::sessions::print_sessions_table(&sessions, chat.sessions().current_id());
                Outcome::Done
            }
            SpecialCommand::SwitchSession(id) => {
                if chat.select_session(&id) {
                    print_transcript(chat);
                    Outcome::Done
                } else {
                    println!("{}", format!("No session with id {}", id).yellow());
                    Outcome::Failed
                }
            }
            SpecialCommand::DeleteSession(id) => {
                if chat.sessions().get(&id).is_none() {
                    println!(
                        "{} ({})",
                        i18n::delete_failed(chat.language()).yellow(),
                        id
                    );
                    return Outcome::Failed;
                }
                let outcome = chat.delete_session(&id).await;
                println!("{}", format!("Deleted session {}", id).green());
                outcome
            }
            SpecialCommand::Like(n) | SpecialCommand::Dislike(n) => {
                let like = matches!(command, SpecialCommand::Like(_));
                let changed = match message_id(chat, n) {
                    Some(id) if like => chat.like(&id),
                    Some(id) => chat.dislike(&id),
                    None => false,
                };
                if changed {
                    Outcome::Done
                } else {
                    println!("{}", format!("Message {} is not an assistant reply", n).yellow());
                    Outcome::Failed
                }
            }
            SpecialCommand::Refresh(n) => {
                let Some(id) = message_id(chat, n) else {
                    println!("{}", format!("No message {}", n).yellow());
                    return Outcome::Failed;
                };
                let outcome = chat.refresh(&id).await;
                if outcome == Outcome::Done {
                    if let Some(msg) = chat.messages().iter().find(|m| m.id == id) {
                        print_message(n, msg);
                    }
                }
                outcome
            }
            SpecialCommand::Summary => {
                let outcome = chat.summarize().await;
                if outcome == Outcome::Done {
                    println!("\n{}\n{}\n", "Summary".bold(), chat.summary_panel().text);
                    chat.close_summary();
                }
                outcome
            }
            SpecialCommand::Attach(path) => {
                let attached = Attachment::load(&path, chat.language())
                    .and_then(|a| chat.attach(a).map_err(Into::into));
                match attached {
                    Ok(()) => {
                        println!(
                            "{} {}",
                            "Attached".green(),
                            path.display().to_string().cyan()
                        );
                        Outcome::Done
                    }
                    Err(e) => {
                        println!("{}", e.to_string().red());
                        Outcome::Failed
                    }
                }
            }
            SpecialCommand::Detach => {
                chat.detach();
                Outcome::Done
            }
            SpecialCommand::Filter(tag) => {
                let on = chat.toggle_filter(&tag);
                println!("Filter {} {}", tag.cyan(), if on { "on" } else { "off" });
                Outcome::Done
            }
            SpecialCommand::Ask(n) => {
                let before = chat.messages().len();
                let outcome = chat.ask(n - 1).await;
                print_new_messages(chat, before);
                outcome
            }
            SpecialCommand::ToggleLanguage => {
                let lang = chat.toggle_language();
                println!("Language: {}", lang.to_string().cyan());
                Outcome::Done
            }
            SpecialCommand::Help
            | SpecialCommand::Exit
            | SpecialCommand::Logout
            | SpecialCommand::None => Outcome::Done,
        }
    }

    fn format_prompt(chat: &ChatController) -> String {
        let mut tags = vec![chat.language().to_string()];
        if !chat.filters().is_empty() {
            tags.push(chat.filters().join(","));
        }
        if let Some(file) = chat.attachment() {
            tags.push(format!("+{}", file.filename));
        }
        format!("[{}] >> ", tags.join(" ")).cyan().to_string()
    }

    fn print_welcome_banner(chat: &ChatController) {
        println!("{}", "Bankchat".bold());
        if let Some(user) = chat.user() {
            println!("Signed in as {}", user.username.cyan());
        }
        if let Some(session) = chat.current_session() {
            println!("Session: {} ({})", session.title, session.id.dimmed());
        }
        println!("Type {} for commands.\n", "/help".cyan());
        if chat.messages().is_empty() {
            print_suggestions(chat);
        } else {
            print_transcript(chat);
        }
    }

    fn print_suggestions(chat: &ChatController) {
        for (i, question) in i18n::suggested_questions(chat.language()).iter().enumerate() {
            println!("  /ask {}  {}", i + 1, question.dimmed());
        }
        println!();
    }

    fn print_transcript(chat: &ChatController) {
        for (i, msg) in chat.visible_messages().into_iter().enumerate() {
            print_message(i + 1, msg);
        }
    }

    fn print_new_messages(chat: &ChatController, before: usize) {
        let visible = chat.visible_messages();
        let offset = visible.len().saturating_sub(chat.messages().len() - before);
        for (i, msg) in visible.iter().enumerate().skip(offset) {
            if msg.is_ai() {
                print_message(i + 1, msg);
            }
        }
    }

    fn print_message(number: usize, msg: &Message) {
        let label = if msg.is_ai() {
            "Assistant".green().bold()
        } else {
            "You".blue().bold()
        };
        let mut flags = String::new();
        if msg.liked {
            flags.push_str(" [liked]");
        }
        if msg.disliked {
            flags.push_str(" [disliked]");
        }
        println!("[{}] {}{}: {}", number, label, flags.dimmed(), msg.text);
        if let Some(sources) = msg.sources.as_ref().filter(|s| !s.is_empty()) {
            for source in sources {
                let title = source
                    .metadata
                    .get("title")
                    .or_else(|| source.metadata.get("source"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("document");
                println!("    {} {} ({:.2})", "source:".dimmed(), title, source.score);
            }
        }
        println!();
    }
}
