//! Bankchat - banking assistant proxy and chat client
//!
//! Main entry point for the bankchat binary.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bankchat::cli::{Cli, Commands};
use bankchat::commands;
use bankchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Serve {
            listen,
            backend_url,
        } => {
            tracing::info!("Starting API proxy");
            commands::serve::run_serve(config, listen, backend_url).await?;
            Ok(())
        }
        Commands::Login { username, password } => {
            tracing::info!("Logging in as {}", username);
            commands::auth::login(config, username, password).await?;
            Ok(())
        }
        Commands::Logout => {
            commands::auth::logout(config)?;
            Ok(())
        }
        Commands::Chat { language } => {
            tracing::info!("Starting interactive chat mode");
            if let Some(lang) = &language {
                tracing::debug!("Using language override: {}", lang);
            }
            commands::chat::run_chat(config, language).await?;
            Ok(())
        }
        Commands::Sessions { command } => {
            tracing::info!("Starting sessions command");
            commands::sessions::handle_sessions(config, command).await?;
            Ok(())
        }
        Commands::Summary => {
            commands::chat::run_summary(config).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber
///
/// `RUST_LOG` wins; otherwise `bankchat=info`, or `bankchat=debug` with
/// `--verbose`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "bankchat=debug,tower_http=debug"
    } else {
        "bankchat=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
