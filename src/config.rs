//! Configuration management for Bankchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::client::models::Language;
use crate::error::{BankchatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest attachment accepted by both the proxy and the client (10 MB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Main configuration structure for Bankchat
///
/// Holds the proxy server settings and the chat client settings. Both halves
/// are read from the same YAML file so one file can describe a deployment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API proxy server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Chat client configuration
    #[serde(default)]
    pub client: ClientConfig,
}

/// API proxy server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the proxy listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Base URL of the backend service every route forwards to
    ///
    /// The `BACKEND_URL` environment variable takes precedence.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Timeout for a single backend request (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_max_upload_bytes() -> usize {
    MAX_UPLOAD_BYTES
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            backend_url: default_backend_url(),
            max_upload_bytes: default_max_upload_bytes(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Chat client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the API proxy, including the `/api` prefix
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Initial conversation language
    #[serde(default)]
    pub language: Language,

    /// Timeout for a single proxy request (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Override for the local persisted store location
    ///
    /// When unset, the store lives in the user's data directory.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

fn default_api_base() -> String {
    "http://127.0.0.1:3000/api".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            language: Language::default(),
            request_timeout_seconds: default_request_timeout(),
            storage_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BankchatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| BankchatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(backend_url) = std::env::var("BACKEND_URL") {
            tracing::debug!(backend_url = %backend_url, "Env override: BACKEND_URL");
            self.server.backend_url = backend_url;
        }

        if let Ok(listen_addr) = std::env::var("BANKCHAT_LISTEN_ADDR") {
            tracing::debug!(listen_addr = %listen_addr, "Env override: BANKCHAT_LISTEN_ADDR");
            self.server.listen_addr = listen_addr;
        }

        if let Ok(api_base) = std::env::var("BANKCHAT_API_BASE") {
            tracing::debug!(api_base = %api_base, "Env override: BANKCHAT_API_BASE");
            self.client.api_base = api_base;
        }

        if let Ok(language) = std::env::var("BANKCHAT_LANGUAGE") {
            match language.parse::<Language>() {
                Ok(lang) => self.client.language = lang,
                Err(_) => tracing::warn!("Invalid BANKCHAT_LANGUAGE: {}", language),
            }
        }

        if let Ok(timeout) = std::env::var("BANKCHAT_REQUEST_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse::<u64>() {
                self.server.request_timeout_seconds = value;
                self.client.request_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid BANKCHAT_REQUEST_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(db_path) = std::env::var("BANKCHAT_STORAGE_DB") {
            self.client.storage_path = Some(PathBuf::from(db_path));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(path) = &cli.storage_path {
            tracing::debug!("Using storage path from CLI: {}", path);
            self.client.storage_path = Some(PathBuf::from(path));
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if a URL does not parse, the listen address is not a
    /// socket address, or a limit is zero.
    pub fn validate(&self) -> Result<()> {
        validate_http_url("server.backend_url", &self.server.backend_url)?;
        validate_http_url("client.api_base", &self.client.api_base)?;

        if self
            .server
            .listen_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(BankchatError::Config(format!(
                "server.listen_addr is not a socket address: {}",
                self.server.listen_addr
            ))
            .into());
        }

        if self.server.max_upload_bytes == 0 {
            return Err(BankchatError::Config(
                "server.max_upload_bytes must be greater than 0".to_string(),
            )
            .into());
        }

        if self.server.request_timeout_seconds == 0 || self.client.request_timeout_seconds == 0 {
            return Err(BankchatError::Config(
                "request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| BankchatError::Config(format!("{} is not a valid URL: {}", field, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(BankchatError::Config(format!(
            "{} must use http or https, got {}",
            field, other
        ))
        .into()),
    }
}
