//! Chat client data model
//!
//! Sessions, messages and user records as the client keeps them in memory
//! and in the persisted store. Field names serialize in camelCase so the
//! persisted format matches what the sessions backend returns.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Conversation language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    #[default]
    En,
    /// Arabic
    Ar,
}

impl Language {
    /// Wire representation (`en` or `ar`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    /// The other supported language
    pub fn toggled(&self) -> Self {
        match self {
            Language::En => Language::Ar,
            Language::Ar => Language::En,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "ar" | "arabic" => Ok(Language::Ar),
            other => Err(format!("Unsupported language: {}", other)),
        }
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The signed-in user
    User,
    /// The assistant
    Ai,
}

/// A document passage the assistant cited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Cited passage
    #[serde(default)]
    pub text: String,
    /// Retrieval relevance score
    #[serde(default)]
    pub score: f64,
    /// Document metadata (title, page, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub liked: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disliked: bool,
    /// The user query that produced this AI message, used by refresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_query: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Message {
    /// Create a user message stamped with the current time
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: next_message_id(),
            text: text.into(),
            sender: Sender::User,
            timestamp: Utc::now(),
            sources: None,
            liked: false,
            disliked: false,
            original_query: None,
        }
    }

    /// Create an assistant message stamped with the current time
    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Ai,
            ..Self::user(text)
        }
    }

    /// Attach cited sources
    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Record the query that produced this message
    pub fn with_original_query(mut self, query: impl Into<String>) -> Self {
        self.original_query = Some(query.into());
        self
    }

    pub fn is_ai(&self) -> bool {
        self.sender == Sender::Ai
    }
}

/// A named conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Create an empty session created and updated now
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The signed-in user, as returned by the login endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub role: String,
}

/// Message ids are millisecond timestamps with a process-wide sequence
/// suffix so two messages created in the same millisecond stay distinct.
pub fn next_message_id() -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}", Utc::now().timestamp_millis(), seq)
}

/// Accepts RFC 3339 timestamps and the offset-less ISO form the backend
/// emits (`2024-05-01T10:00:00.123456`), which is read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
