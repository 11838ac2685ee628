//! API proxy in front of the assistant backend
//!
//! Exposes `/api/auth/login`, `/api/chat`, `/api/chat-summary`,
//! `/api/upload` and `/api/chat-sessions[/:id]`. Every route except login
//! requires `Authorization: Bearer <token>` and forwards it unchanged.

pub mod error;
pub mod routes;
pub mod server;
pub mod upstream;

pub use error::ProxyError;
pub use server::{router, ProxyServer, ProxyState};
pub use upstream::Backend;
