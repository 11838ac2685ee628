//! Two-tier session cache
//!
//! The remote tier is the sessions API; the local tier is the persisted
//! store's `chat_sessions` mirror. On load the remote list wins and
//! replaces the mirror. Every write goes to the mirror, so a later local
//! read sees it even when the remote tier is down.

use chrono::Utc;
use std::sync::Arc;

use super::api::RemoteSessions;
use super::models::{ChatSession, Message, Sender};
use crate::error::{is_unauthorized, Result};
use crate::storage::{keys, read_json, write_json, LocalStore};

/// Longest session title derived from a first message
pub const MAX_TITLE_CHARS: usize = 30;

/// Title for a session whose first message is `text`
///
/// # Examples
///
/// ```
/// use bankchat::client::sessions::title_from_message;
///
/// assert_eq!(title_from_message("Hi"), "Hi");
/// assert_eq!(
///     title_from_message("What are the current mortgage rates for 2024?"),
///     "What are the current mortgage ..."
/// );
/// ```
pub fn title_from_message(text: &str) -> String {
    if text.chars().count() <= MAX_TITLE_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(MAX_TITLE_CHARS).collect();
    format!("{}...", head)
}

/// Fallback id used when the remote tier cannot allocate one
pub fn local_session_id() -> String {
    format!("chat_{}", Utc::now().timestamp_millis())
}

/// What happened to the current session after a delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextSession {
    /// A session other than the current one was deleted
    Unchanged,
    /// The current session was deleted; this one is current now
    Switched(String),
    /// The last session was deleted; this fresh one replaced it
    Created(String),
}

/// Result of [`SessionStore::delete`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub next: NextSession,
    /// The remote tier answered 401; local removal still happened
    pub remote_unauthorized: bool,
}

/// Session list with a remote and a local tier
pub struct SessionStore {
    remote: Arc<dyn RemoteSessions>,
    local: Arc<dyn LocalStore>,
    sessions: Vec<ChatSession>,
    current_id: Option<String>,
}

impl SessionStore {
    pub fn new(remote: Arc<dyn RemoteSessions>, local: Arc<dyn LocalStore>) -> Self {
        Self {
            remote,
            local,
            sessions: Vec::new(),
            current_id: None,
        }
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    /// Sessions ordered newest `updated_at` first
    pub fn sessions_by_recency(&self) -> Vec<&ChatSession> {
        let mut sorted: Vec<&ChatSession> = self.sessions.iter().collect();
        sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sorted
    }

    pub fn get(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn current(&self) -> Option<&ChatSession> {
        self.current_id.as_deref().and_then(|id| self.get(id))
    }

    /// Load the session list
    ///
    /// A successful remote list replaces the local mirror. Any other remote
    /// failure falls back to the mirror.
    ///
    /// # Errors
    ///
    /// Only a remote 401 is returned, so the caller can send the user to
    /// login.
    pub async fn load(&mut self, token: &str) -> Result<&[ChatSession]> {
        match self.remote.list_sessions(token).await {
            Ok(sessions) => {
                tracing::debug!(count = sessions.len(), "Loaded sessions from API");
                self.sessions = sessions;
                self.persist();
            }
            Err(e) if is_unauthorized(&e) => return Err(e),
            Err(e) => {
                tracing::warn!("Failed to load sessions from API, using local copy: {}", e);
                self.sessions = self.load_local();
            }
        }
        Ok(&self.sessions)
    }

    /// Read the local mirror; a missing or corrupt mirror is empty
    pub fn load_local(&self) -> Vec<ChatSession> {
        read_json(self.local.as_ref(), keys::CHAT_SESSIONS)
            .unwrap_or_else(|e| {
                tracing::error!("Failed to read local sessions: {}", e);
                None
            })
            .unwrap_or_default()
    }

    /// Build a new empty session, asking the remote tier for its id
    ///
    /// The session is not added to the list; see [`SessionStore::insert`].
    ///
    /// # Errors
    ///
    /// Only a remote 401 is returned; other failures use a local id.
    pub async fn create(&self, token: Option<&str>, title: &str) -> Result<ChatSession> {
        let id = match token {
            Some(token) => match self.remote.create_session(token, title).await {
                Ok(id) if !id.is_empty() => id,
                Ok(_) => local_session_id(),
                Err(e) if is_unauthorized(&e) => return Err(e),
                Err(e) => {
                    tracing::warn!("Failed to create session via API, using local id: {}", e);
                    local_session_id()
                }
            },
            None => local_session_id(),
        };
        Ok(ChatSession::new(id, title))
    }

    /// Add a session at the front of the list and make it current
    pub fn insert(&mut self, session: ChatSession) {
        let id = session.id.clone();
        self.sessions.retain(|s| s.id != id);
        self.sessions.insert(0, session);
        self.persist();
        self.set_current(&id);
    }

    /// Write the in-memory list to the local mirror
    ///
    /// Failures are logged; the in-memory list stays authoritative.
    pub fn persist(&self) {
        if let Err(e) = write_json(self.local.as_ref(), keys::CHAT_SESSIONS, &self.sessions) {
            tracing::error!("Error saving chat sessions: {}", e);
        }
    }

    /// Make a session current; `false` if no session has that id
    pub fn select(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.set_current(id);
        true
    }

    /// The persisted current id, if it names a loaded session
    pub fn stored_current_id(&self) -> Option<String> {
        let stored = self
            .local
            .get(keys::CURRENT_SESSION_ID)
            .unwrap_or_else(|e| {
                tracing::error!("Failed to read current session id: {}", e);
                None
            })?;
        self.get(&stored).map(|s| s.id.clone())
    }

    fn set_current(&mut self, id: &str) {
        self.current_id = Some(id.to_string());
        for key in [keys::CURRENT_SESSION_ID, keys::CONVERSATION_ID] {
            if let Err(e) = self.local.set(key, id) {
                tracing::error!("Failed to persist {}: {}", key, e);
            }
        }
    }

    /// Replace the current session's messages
    ///
    /// Bumps `updated_at` and, when the only message is from the user,
    /// derives the title from it.
    pub fn update_messages(&mut self, messages: &[Message]) {
        let Some(current) = self.current_id.clone() else {
            return;
        };
        if let Some(session) = self.sessions.iter_mut().find(|s| s.id == current) {
            session.messages = messages.to_vec();
            session.updated_at = Utc::now();
            if messages.len() == 1 && messages[0].sender == Sender::User {
                session.title = title_from_message(&messages[0].text);
            }
        }
        self.persist();
    }

    /// Delete a session
    ///
    /// The remote call is best effort. Local removal always happens. When
    /// the current session is removed, the remaining session with the
    /// latest `updated_at` becomes current, or one fresh session titled
    /// `fresh_title` is created if none remain.
    pub async fn delete(&mut self, token: Option<&str>, id: &str, fresh_title: &str) -> DeleteOutcome {
        let mut remote_unauthorized = false;
        if let Some(token) = token {
            if let Err(e) = self.remote.delete_session(token, id).await {
                remote_unauthorized = is_unauthorized(&e);
                tracing::warn!("Failed to delete session {} via API: {}", id, e);
            }
        }

        self.sessions.retain(|s| s.id != id);
        self.persist();

        if self.current_id.as_deref() != Some(id) {
            return DeleteOutcome {
                next: NextSession::Unchanged,
                remote_unauthorized,
            };
        }

        let next = match self.sessions_by_recency().first().map(|s| s.id.clone()) {
            Some(next_id) => {
                self.set_current(&next_id);
                NextSession::Switched(next_id)
            }
            None => {
                let session = match self.create(token, fresh_title).await {
                    Ok(session) => session,
                    Err(e) => {
                        tracing::warn!("Creating replacement session remotely failed: {}", e);
                        ChatSession::new(local_session_id(), fresh_title)
                    }
                };
                let new_id = session.id.clone();
                self.insert(session);
                NextSession::Created(new_id)
            }
        };

        DeleteOutcome {
            next,
            remote_unauthorized,
        }
    }
}
