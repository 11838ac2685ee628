//! Chat client core
//!
//! Everything the chat view does short of rendering: authentication state,
//! the two-tier session cache, message submission, refresh, feedback,
//! attachments and summaries. All network access goes through the proxy's
//! `/api` surface.

pub mod api;
pub mod attachment;
pub mod auth;
pub mod chat;
pub mod i18n;
pub mod models;
pub mod sessions;
pub mod summary;

pub use api::{ApiClient, ChatService, RemoteSessions, UploadRequest};
pub use attachment::Attachment;
pub use auth::{AuthSession, Route};
pub use chat::{ChatController, Outcome};
pub use models::{ChatSession, Language, Message, Sender, Source, UserInfo};
pub use sessions::SessionStore;
