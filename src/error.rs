//! Error types for Bankchat
//!
//! This module defines the error types shared by the proxy server and the
//! chat client, using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Bankchat operations
///
/// Covers configuration loading, local storage, backend/proxy API calls,
/// input validation and attachment checks.
#[derive(Error, Debug)]
pub enum BankchatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local persisted storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Non-success HTTP response carrying the server's `detail` message
    #[error("API error ({status}): {}", detail_or_status(.detail))]
    Api {
        /// HTTP status code returned by the server
        status: u16,
        /// The `detail` field of the error body; empty when the body has none
        detail: String,
    },

    /// Missing or rejected bearer token (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Input rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Attachment rejected by size or type checks
    #[error("Attachment rejected: {0}")]
    Attachment(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BankchatError {
    /// Returns true when the error means the session is no longer authenticated
    pub fn is_unauthorized(&self) -> bool {
        match self {
            BankchatError::Unauthorized(_) => true,
            BankchatError::Api { status, .. } => *status == 401,
            _ => false,
        }
    }
}

fn detail_or_status(detail: &str) -> &str {
    if detail.is_empty() {
        "no detail"
    } else {
        detail
    }
}

/// Returns true if an `anyhow` error wraps an unauthorized `BankchatError`
pub fn is_unauthorized(err: &anyhow::Error) -> bool {
    err.downcast_ref::<BankchatError>()
        .map(BankchatError::is_unauthorized)
        .unwrap_or(false)
}

/// Result type alias for Bankchat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
