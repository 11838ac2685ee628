//! Bankchat - banking assistant proxy and chat client library
//!
//! This library provides the API proxy that sits in front of the assistant
//! backend and the client core that drives a chat against it.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `proxy`: axum router forwarding `/api/*` routes to the backend
//! - `client`: authentication, the two-tier session cache, chat actions,
//!   attachments and summaries
//! - `storage`: persisted key-value store backing the client
//! - `types`: request and response bodies shared by proxy and client
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use bankchat::config::Config;
//! use bankchat::proxy::ProxyServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let mut server = ProxyServer::new(&config.server)?;
//!     let addr = server.start(config.server.listen_addr.parse()?).await?;
//!     println!("listening on {}", addr);
//!     tokio::signal::ctrl_c().await?;
//!     server.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod proxy;
pub mod storage;
pub mod types;

pub use client::{ApiClient, ChatController};
pub use config::Config;
pub use error::{BankchatError, Result};
pub use proxy::ProxyServer;

#[cfg(test)]
pub mod test_utils;
