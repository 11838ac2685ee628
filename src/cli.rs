//! Command-line interface definition for Bankchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for running the proxy and driving the chat client.

use clap::{Parser, Subcommand};

/// Bankchat - banking assistant proxy and chat client
///
/// Run the API proxy in front of the assistant backend, or log in and
/// chat with the assistant from the terminal.
#[derive(Parser, Debug, Clone)]
#[command(name = "bankchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the local persisted store location
    #[arg(long, env = "BANKCHAT_STORAGE_DB")]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Bankchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the API proxy server
    Serve {
        /// Address to listen on (overrides config)
        #[arg(short, long)]
        listen: Option<String>,

        /// Backend base URL (overrides config and BACKEND_URL)
        #[arg(short, long)]
        backend_url: Option<String>,
    },

    /// Log in and store the bearer token locally
    Login {
        /// Username
        #[arg(short, long)]
        username: String,

        /// Password (prompted for when omitted)
        #[arg(short, long, env = "BANKCHAT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Clear the stored token and user record
    Logout,

    /// Start interactive chat mode
    Chat {
        /// Conversation language (en, ar)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Manage stored chat sessions
    Sessions {
        /// Session subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Summarize the current chat session
    Summary,
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List chat sessions
    List,

    /// Delete a chat session
    Delete {
        /// Session ID
        id: String,
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
            verbose: false,
            storage_path: None,
            command: Commands::Logout,
        }
    }
}
