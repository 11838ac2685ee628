//! Special commands parser for the interactive chat
//!
//! Input starting with `/` is a command; anything else is sent as a chat
//! message. Command names are case-insensitive; arguments (session ids,
//! paths, tags) keep their case.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
///
/// Message numbers are 1-based positions in the displayed conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new session
    NewSession,
    /// List sessions, newest first
    ListSessions,
    /// Make another session current
    SwitchSession(String),
    /// Delete a session
    DeleteSession(String),
    /// Toggle like on an assistant message
    Like(usize),
    /// Toggle dislike on an assistant message
    Dislike(usize),
    /// Re-ask the query behind an assistant message
    Refresh(usize),
    /// Summarize the conversation
    Summary,
    /// Attach a file to the next message
    Attach(PathBuf),
    /// Drop the pending attachment
    Detach,
    /// Toggle a filter tag
    Filter(String),
    /// Send a starter question
    Ask(usize),
    /// Switch between English and Arabic
    ToggleLanguage,
    /// Sign out and leave the chat
    Logout,
    /// Display help information
    Help,
    /// Exit the interactive session
    Exit,
    /// Not a special command; send as a message
    None,
}

fn missing(command: &str, usage: &str) -> CommandError {
    CommandError::MissingArgument {
        command: command.to_string(),
        usage: usage.to_string(),
    }
}

fn parse_number(command: &str, arg: &str) -> Result<usize, CommandError> {
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        }),
    }
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` for an unrecognized `/` command,
/// `CommandError::MissingArgument` when a required argument is absent and
/// `CommandError::UnsupportedArgument` for a malformed one.
///
/// # Examples
///
/// ```
/// use bankchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/switch chat_17").unwrap();
/// assert_eq!(cmd, SpecialCommand::SwitchSession("chat_17".to_string()));
///
/// let cmd = parse_special_command("/LIKE 2").unwrap();
/// assert_eq!(cmd, SpecialCommand::Like(2));
///
/// let cmd = parse_special_command("What is my balance?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
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

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match name.as_str() {
        "/new" => Ok(SpecialCommand::NewSession),
        "/sessions" => Ok(SpecialCommand::ListSessions),
        "/switch" if arg.is_empty() => Err(missing("/switch", "/switch <session_id>")),
        "/switch" => Ok(SpecialCommand::SwitchSession(arg.to_string())),
        "/delete" if arg.is_empty() => Err(missing("/delete", "/delete <session_id>")),
        "/delete" => Ok(SpecialCommand::DeleteSession(arg.to_string())),
        "/like" if arg.is_empty() => Err(missing("/like", "/like <message_number>")),
        "/like" => parse_number("/like", arg).map(SpecialCommand::Like),
        "/dislike" if arg.is_empty() => Err(missing("/dislike", "/dislike <message_number>")),
        "/dislike" => parse_number("/dislike", arg).map(SpecialCommand::Dislike),
        "/refresh" if arg.is_empty() => Err(missing("/refresh", "/refresh <message_number>")),
        "/refresh" => parse_number("/refresh", arg).map(SpecialCommand::Refresh),
        "/summary" => Ok(SpecialCommand::Summary),
        "/attach" if arg.is_empty() => Err(missing("/attach", "/attach <path>")),
        "/attach" => Ok(SpecialCommand::Attach(PathBuf::from(arg))),
        "/detach" => Ok(SpecialCommand::Detach),
        "/filter" if arg.is_empty() => Err(missing("/filter", "/filter <tag>")),
        "/filter" => Ok(SpecialCommand::Filter(arg.to_string())),
        "/ask" if arg.is_empty() => Err(missing("/ask", "/ask <1-4>")),
        "/ask" => match parse_number("/ask", arg)? {
            n @ 1..=4 => Ok(SpecialCommand::Ask(n)),
            _ => Err(CommandError::UnsupportedArgument {
                command: "/ask".to_string(),
                arg: arg.to_string(),
            }),
        },
        "/lang" | "/language" => Ok(SpecialCommand::ToggleLanguage),
        "/logout" => Ok(SpecialCommand::Logout),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

SESSIONS:
  /new              - Start a new chat session
  /sessions         - List sessions, newest first
  /switch <id>      - Switch to another session
  /delete <id>      - Delete a session

MESSAGES:
  /like <n>         - Toggle like on assistant message n
  /dislike <n>      - Toggle dislike on assistant message n
  /refresh <n>      - Ask the question behind message n again
  /summary          - Summarize this conversation
  /ask <1-4>        - Send one of the starter questions

INPUT:
  /attach <path>    - Attach a file (PDF, Office, text or image; max 10MB)
  /detach           - Remove the pending attachment
  /filter <tag>     - Toggle a filter tag sent with messages
  /lang             - Switch between English and Arabic

SESSION CONTROL:
  /logout           - Sign out and exit
  /help             - Show this help message
  exit, /quit       - Exit interactive mode

NOTES:
  - Regular text (not starting with /) is sent to the assistant
  - With a file attached, an empty line sends just the file
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("hello there").unwrap(),
            SpecialCommand::None
        );
        assert_eq!(parse_special_command("").unwrap(), SpecialCommand::None);
    }

    #[test]
    fn test_exit_aliases() {
        for input in ["exit", "QUIT", "/exit", "/quit"] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::Exit);
        }
    }

    #[test]
    fn test_session_commands_keep_argument_case() {
        assert_eq!(
            parse_special_command("/Switch Chat_ABC").unwrap(),
            SpecialCommand::SwitchSession("Chat_ABC".to_string())
        );
        assert_eq!(
            parse_special_command("/delete   chat_1  ").unwrap(),
            SpecialCommand::DeleteSession("chat_1".to_string())
        );
    }

    #[test]
    fn test_attach_path_with_spaces() {
        assert_eq!(
            parse_special_command("/attach /tmp/My Statement.pdf").unwrap(),
            SpecialCommand::Attach(PathBuf::from("/tmp/My Statement.pdf"))
        );
    }

    #[test]
    fn test_missing_arguments() {
        let err = parse_special_command("/switch").unwrap_err();
        assert!(matches!(err, CommandError::MissingArgument { .. }));
        assert!(err.to_string().contains("/switch <session_id>"));
        assert!(parse_special_command("/filter").is_err());
    }

    #[test]
    fn test_message_numbers_must_be_positive() {
        assert_eq!(
            parse_special_command("/refresh 3").unwrap(),
            SpecialCommand::Refresh(3)
        );
        assert!(matches!(
            parse_special_command("/like 0").unwrap_err(),
            CommandError::UnsupportedArgument { .. }
        ));
        assert!(parse_special_command("/dislike two").is_err());
    }

    #[test]
    fn test_ask_range() {
        assert_eq!(
            parse_special_command("/ask 4").unwrap(),
            SpecialCommand::Ask(4)
        );
        assert!(parse_special_command("/ask 5").is_err());
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_special_command("/transfer 100").unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("/transfer".to_string()));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(
            parse_special_command("/new").unwrap(),
            SpecialCommand::NewSession
        );
        assert_eq!(
            parse_special_command("/LANG").unwrap(),
            SpecialCommand::ToggleLanguage
        );
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
        assert_eq!(
            parse_special_command("/summary").unwrap(),
            SpecialCommand::Summary
        );
    }
}
