//! Request and response bodies shared by the proxy routes and the client
//!
//! The chat response has one canonical shape: the answer lives in
//! `message`. Backends that answer with `response` instead are accepted on
//! input through [`UpstreamChatResponse`].

use crate::client::models::{ChatSession, Language, Source, UserInfo};
use serde::{Deserialize, Serialize};

/// Error body used by every route: `{"detail": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// The backend names this `user_info`; the proxy re-emits it as `user`
    #[serde(alias = "user_info")]
    pub user: UserInfo,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// A prior turn sent along with a chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_history: Option<Vec<HistoryEntry>>,
}

/// Canonical chat/upload response returned by the proxy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub language: Language,
}

/// Chat response as the backend may send it
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpstreamChatResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
}

impl UpstreamChatResponse {
    /// Map to the canonical shape
    ///
    /// The answer prefers `response` over `message`; the conversation id
    /// falls back to `id` and then to the id the client sent.
    pub fn into_canonical(
        self,
        requested_conversation_id: Option<&str>,
        language: Language,
    ) -> ChatResponse {
        ChatResponse {
            message: self.response.or(self.message).unwrap_or_default(),
            conversation_id: self
                .conversation_id
                .or(self.id)
                .or_else(|| requested_conversation_id.map(str::to_string))
                .unwrap_or_default(),
            sources: self.sources.unwrap_or_default(),
            language,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub conversation_history: String,
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionsResponse {
    #[serde(default)]
    pub sessions: Vec<ChatSession>,
}

/// Document upload body sent to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentUpload {
    pub filename: String,
    pub content: String,
    #[serde(default = "default_classification")]
    pub classification: String,
}

fn default_classification() -> String {
    "public".to_string()
}

/// JSON-wrapped upload accepted by the proxy as an alternative to multipart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonUploadRequest {
    pub filename: String,
    pub content: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub filters: Vec<String>,
}
