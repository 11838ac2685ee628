//! Chat view state and actions
//!
//! [`ChatController`] owns the message list of the current session, the
//! pending attachment, the selected filters and the language. Each action
//! returns an [`Outcome`]; `Outcome::Redirect` means the caller must leave
//! the chat view (the token is missing or was rejected).

use std::sync::Arc;

use super::api::{ChatService, RemoteSessions, UploadRequest};
use super::attachment::Attachment;
use super::auth::{AuthSession, Route};
use super::i18n;
use super::models::{ChatSession, Language, Message, Sender, UserInfo};
use super::sessions::{NextSession, SessionStore};
use super::summary::{self, SummaryPanel};
use crate::error::{is_unauthorized, BankchatError, Result};
use crate::storage::{keys, LocalStore};
use crate::types::{ChatRequest, ChatResponse, HistoryEntry};

const INLINE_SUMMARY_PREFIXES: [&str; 4] = [
    "summary of this conversation",
    "summary of the conversation",
    "conversation summary",
    "here is a summary of our conversation",
];

/// True for assistant text that is a summary rendered inline
pub fn is_inline_summary(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    INLINE_SUMMARY_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
}

/// Result of a chat action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The action completed
    Done,
    /// The request failed; an inline error message may have been appended
    Failed,
    /// The action was not allowed in the current state; nothing was sent
    Rejected,
    /// Leave the chat view for this route
    Redirect(Route),
}

pub struct ChatController {
    api: Arc<dyn ChatService>,
    local: Arc<dyn LocalStore>,
    auth: AuthSession,
    sessions: SessionStore,
    messages: Vec<Message>,
    language: Language,
    conversation_id: Option<String>,
    filters: Vec<String>,
    attachment: Option<Attachment>,
    loading: bool,
    refreshing_id: Option<String>,
    summary: SummaryPanel,
    user: Option<UserInfo>,
}

impl ChatController {
    pub fn new(
        api: Arc<dyn ChatService>,
        remote: Arc<dyn RemoteSessions>,
        local: Arc<dyn LocalStore>,
        language: Language,
    ) -> Self {
        Self {
            api,
            auth: AuthSession::new(local.clone()),
            sessions: SessionStore::new(remote, local.clone()),
            local,
            messages: Vec::new(),
            language,
            conversation_id: None,
            filters: Vec::new(),
            attachment: None,
            loading: false,
            refreshing_id: None,
            summary: SummaryPanel::default(),
            user: None,
        }
    }

    /// Enter the chat view
    ///
    /// Loads the sessions, then restores the stored current session or
    /// starts a new one.
    pub async fn init(&mut self) -> Outcome {
        let Some(token) = self.auth.token() else {
            return Outcome::Redirect(Route::Login);
        };
        self.user = self.auth.user_info();

        if let Err(e) = self.sessions.load(&token).await {
            return self.failure_outcome(&e);
        }

        match self.sessions.stored_current_id() {
            Some(id) => {
                self.open_session(&id);
                Outcome::Done
            }
            None => self.new_session().await,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages to render; inline summaries from the assistant are hidden
    pub fn visible_messages(&self) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| !(m.is_ai() && is_inline_summary(&m.text)))
            .collect()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn current_session(&self) -> Option<&ChatSession> {
        self.sessions.current()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn refreshing_id(&self) -> Option<&str> {
        self.refreshing_id.as_deref()
    }

    pub fn summary_panel(&self) -> &SummaryPanel {
        &self.summary
    }

    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    /// Select a file for the next submission
    ///
    /// # Errors
    ///
    /// Returns a localized `BankchatError::Attachment` when the file is too
    /// large or of an unsupported type; the previous selection is kept.
    pub fn attach(&mut self, attachment: Attachment) -> std::result::Result<(), BankchatError> {
        attachment.validate(self.language)?;
        tracing::debug!(filename = %attachment.filename, bytes = attachment.size(), "File attached");
        self.attachment = Some(attachment);
        Ok(())
    }

    pub fn detach(&mut self) {
        self.attachment = None;
    }

    /// Toggle a filter tag; returns whether it is now selected
    pub fn toggle_filter(&mut self, tag: &str) -> bool {
        if let Some(pos) = self.filters.iter().position(|f| f == tag) {
            self.filters.remove(pos);
            false
        } else {
            self.filters.push(tag.to_string());
            true
        }
    }

    pub fn toggle_language(&mut self) -> Language {
        self.language = self.language.toggled();
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Submit text and/or the pending attachment
    ///
    /// The user message is appended before the request is sent. With no
    /// text, the message shows the attached file name instead.
    pub async fn send(&mut self, input: &str) -> Outcome {
        let text = input.trim();
        if (text.is_empty() && self.attachment.is_none()) || self.loading {
            return Outcome::Rejected;
        }
        let Some(token) = self.auth.token() else {
            return Outcome::Redirect(Route::Login);
        };

        let history: Vec<HistoryEntry> = self
            .messages
            .iter()
            .map(|m| HistoryEntry {
                role: match m.sender {
                    Sender::User => "user".to_string(),
                    Sender::Ai => "assistant".to_string(),
                },
                content: m.text.clone(),
            })
            .collect();

        let display_text = match (&self.attachment, text.is_empty()) {
            (Some(file), true) => i18n::file_attached_label(self.language, &file.filename),
            _ => text.to_string(),
        };
        self.push_message(Message::user(display_text));

        self.loading = true;
        let result = match &self.attachment {
            Some(file) => {
                let upload = UploadRequest {
                    attachment: file,
                    message: text.to_string(),
                    conversation_id: self.conversation_id.clone(),
                    language: self.language,
                    filters: self.filters.clone(),
                };
                self.api.upload(&token, &upload).await
            }
            None => {
                let request = ChatRequest {
                    message: text.to_string(),
                    conversation_id: self.conversation_id.clone(),
                    language: self.language,
                    filters: (!self.filters.is_empty()).then(|| self.filters.clone()),
                    conversation_history: Some(history),
                };
                self.api.chat(&token, &request).await
            }
        };
        self.loading = false;

        match result {
            Ok(response) => {
                self.accept_response(response, text);
                Outcome::Done
            }
            Err(e) => self.failure_outcome_with_message(&e),
        }
    }

    /// Send one of the starter questions
    pub async fn ask(&mut self, index: usize) -> Outcome {
        match i18n::suggested_questions(self.language).get(index) {
            Some(question) => self.send(question).await,
            None => Outcome::Rejected,
        }
    }

    fn accept_response(&mut self, response: ChatResponse, query: &str) {
        if !response.conversation_id.is_empty() {
            if let Err(e) = self.local.set(keys::CONVERSATION_ID, &response.conversation_id) {
                tracing::error!("Failed to persist conversation id: {}", e);
            }
            self.conversation_id = Some(response.conversation_id);
        }

        let mut reply = Message::ai(response.message).with_sources(response.sources);
        if !query.is_empty() {
            reply = reply.with_original_query(query);
        }
        self.push_message(reply);
        self.attachment = None;
    }

    /// Re-ask the query behind an assistant message and overwrite it
    pub async fn refresh(&mut self, message_id: &str) -> Outcome {
        if self.refreshing_id.is_some() {
            return Outcome::Rejected;
        }
        let query = match self
            .messages
            .iter()
            .find(|m| m.id == message_id && m.is_ai())
            .and_then(|m| m.original_query.clone())
        {
            Some(q) if !q.trim().is_empty() => q,
            _ => return Outcome::Rejected,
        };
        let Some(token) = self.auth.token() else {
            return Outcome::Redirect(Route::Login);
        };

        self.refreshing_id = Some(message_id.to_string());
        let request = ChatRequest {
            message: query,
            conversation_id: self.conversation_id.clone(),
            language: self.language,
            filters: (!self.filters.is_empty()).then(|| self.filters.clone()),
            conversation_history: None,
        };
        let result = self.api.chat(&token, &request).await;
        self.refreshing_id = None;

        match result {
            Ok(response) => {
                if let Some(msg) = self.messages.iter_mut().find(|m| m.id == message_id) {
                    msg.text = response.message;
                    msg.sources = Some(response.sources);
                }
                self.sessions.update_messages(&self.messages);
                Outcome::Done
            }
            Err(e) if is_unauthorized(&e) => Outcome::Redirect(Route::Login),
            Err(e) => {
                tracing::warn!("Error refreshing message {}: {}", message_id, e);
                Outcome::Failed
            }
        }
    }

    /// Toggle the like flag of an assistant message, clearing dislike
    pub fn like(&mut self, message_id: &str) -> bool {
        self.set_feedback(message_id, true)
    }

    /// Toggle the dislike flag of an assistant message, clearing like
    pub fn dislike(&mut self, message_id: &str) -> bool {
        self.set_feedback(message_id, false)
    }

    fn set_feedback(&mut self, message_id: &str, like: bool) -> bool {
        let Some(msg) = self
            .messages
            .iter_mut()
            .find(|m| m.id == message_id && m.is_ai())
        else {
            return false;
        };
        if like {
            msg.liked = !msg.liked;
            msg.disliked = false;
        } else {
            msg.disliked = !msg.disliked;
            msg.liked = false;
        }
        self.sessions.update_messages(&self.messages);
        true
    }

    /// Start a new empty session and make it current
    pub async fn new_session(&mut self) -> Outcome {
        let token = self.auth.token();
        let title = i18n::new_chat_title(self.language);
        let session = match self.sessions.create(token.as_deref(), title).await {
            Ok(session) => session,
            Err(e) => return self.failure_outcome(&e),
        };
        let id = session.id.clone();
        self.sessions.insert(session);
        self.open_session(&id);
        Outcome::Done
    }

    /// Switch to another session; `false` if the id is unknown
    pub fn select_session(&mut self, id: &str) -> bool {
        if !self.sessions.select(id) {
            return false;
        }
        self.open_session(id);
        true
    }

    fn open_session(&mut self, id: &str) {
        self.sessions.select(id);
        self.messages = self
            .sessions
            .get(id)
            .map(|s| s.messages.clone())
            .unwrap_or_default();
        self.conversation_id = Some(id.to_string());
        self.filters.clear();
        self.attachment = None;
    }

    /// Delete a session, switching away from it if it was current
    pub async fn delete_session(&mut self, id: &str) -> Outcome {
        let token = self.auth.token();
        let title = i18n::new_chat_title(self.language);
        let outcome = self.sessions.delete(token.as_deref(), id, title).await;

        match &outcome.next {
            NextSession::Unchanged => {}
            NextSession::Switched(next) | NextSession::Created(next) => {
                let next = next.clone();
                self.open_session(&next);
            }
        }

        if outcome.remote_unauthorized {
            Outcome::Redirect(Route::Login)
        } else {
            Outcome::Done
        }
    }

    /// Summarize the current conversation into the summary panel
    pub async fn summarize(&mut self) -> Outcome {
        if self.messages.is_empty() {
            return Outcome::Rejected;
        }
        let Some(token) = self.auth.token() else {
            return Outcome::Redirect(Route::Login);
        };

        self.summary = SummaryPanel {
            visible: true,
            loading: true,
            text: String::new(),
        };
        let text =
            summary::summarize(self.api.as_ref(), &token, &self.messages, self.language).await;
        self.summary.loading = false;
        self.summary.text = text.unwrap_or_default();
        Outcome::Done
    }

    pub fn close_summary(&mut self) {
        self.summary.close();
    }

    /// Sign out; the caller should navigate to the returned route
    pub fn logout(&mut self) -> Result<Route> {
        self.user = None;
        self.auth.logout()
    }

    fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.sessions.update_messages(&self.messages);
    }

    fn failure_outcome(&self, err: &anyhow::Error) -> Outcome {
        if is_unauthorized(err) {
            Outcome::Redirect(Route::Login)
        } else {
            tracing::warn!("Chat action failed: {}", err);
            Outcome::Failed
        }
    }

    /// Map a failed submission to an inline assistant message
    fn failure_outcome_with_message(&mut self, err: &anyhow::Error) -> Outcome {
        if is_unauthorized(err) {
            return Outcome::Redirect(Route::Login);
        }
        let text = match err.downcast_ref::<BankchatError>() {
            Some(BankchatError::Api { detail, .. }) => i18n::request_failed(
                self.language,
                Some(detail.as_str()).filter(|d| !d.is_empty()),
            ),
            _ => i18n::connection_error(self.language).to_string(),
        };
        tracing::warn!("Chat request failed: {}", err);
        self.push_message(Message::ai(text));
        Outcome::Failed
    }
}
