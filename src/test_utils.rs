//! Test utilities for Bankchat
//!
//! This module provides temporary directory helpers, assertion helpers and
//! in-process fakes for the remote session and chat APIs.

use crate::client::api::{ChatService, RemoteSessions, UploadRequest};
use crate::client::models::{ChatSession, Language};
use crate::config::Config;
use crate::error::{BankchatError, Result};
use crate::types::{ChatRequest, ChatResponse, SummaryRequest, SummaryResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: std::result::Result<T, BankchatError>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a test configuration with default values
pub fn test_config() -> Config {
    Config::default()
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
server:
  listen_addr: 127.0.0.1:3900
  backend_url: http://localhost:8000
  max_upload_bytes: 10485760
  request_timeout_seconds: 30

client:
  api_base: http://127.0.0.1:3900/api
  language: ar
  request_timeout_seconds: 30
"#
    .to_string()
}

fn status_error(status: u16, detail: &str) -> anyhow::Error {
    if status == 401 {
        BankchatError::Unauthorized(detail.to_string()).into()
    } else {
        BankchatError::Api {
            status,
            detail: detail.to_string(),
        }
        .into()
    }
}

/// In-memory remote session tier
///
/// Created ids are `srv_<n>`. `set_fail_status` makes every call fail with
/// that status until cleared.
#[derive(Default)]
pub struct FakeRemote {
    sessions: Mutex<Vec<ChatSession>>,
    deleted: Mutex<Vec<String>>,
    fail_status: Mutex<Option<u16>>,
    created: Mutex<u32>,
}

impl FakeRemote {
    pub fn with_sessions(sessions: Vec<ChatSession>) -> Self {
        Self {
            sessions: Mutex::new(sessions),
            ..Default::default()
        }
    }

    pub fn failing(status: u16) -> Self {
        let remote = Self::default();
        remote.set_fail_status(Some(status));
        remote
    }

    pub fn set_fail_status(&self, status: Option<u16>) {
        *self.fail_status.lock().unwrap() = status;
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        match *self.fail_status.lock().unwrap() {
            Some(status) => Err(status_error(status, "remote unavailable")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteSessions for FakeRemote {
    async fn list_sessions(&self, _token: &str) -> Result<Vec<ChatSession>> {
        self.check()?;
        Ok(self.sessions.lock().unwrap().clone())
    }

    async fn create_session(&self, _token: &str, _title: &str) -> Result<String> {
        self.check()?;
        let mut created = self.created.lock().unwrap();
        *created += 1;
        Ok(format!("srv_{}", created))
    }

    async fn delete_session(&self, _token: &str, id: &str) -> Result<()> {
        self.check()?;
        self.deleted.lock().unwrap().push(id.to_string());
        self.sessions.lock().unwrap().retain(|s| s.id != id);
        Ok(())
    }
}

/// Scripted answer for [`FakeChat`]
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// Success with this text
    Answer(String),
    /// Non-success HTTP status with a detail
    Status(u16, String),
    /// Connection-level failure
    Transport,
}

/// Scripted chat service
///
/// Replies are consumed in order; with none queued, chat answers
/// `echo: <message>` and summaries answer `summary`.
#[derive(Default)]
pub struct FakeChat {
    replies: Mutex<VecDeque<FakeReply>>,
    requests: Mutex<Vec<ChatRequest>>,
    uploads: Mutex<Vec<(String, String)>>,
    summaries: Mutex<Vec<SummaryRequest>>,
}

impl FakeChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: FakeReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Chat requests received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// `(filename, message)` of uploads received so far
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn summaries(&self) -> Vec<SummaryRequest> {
        self.summaries.lock().unwrap().clone()
    }

    /// Total calls of any kind
    pub fn call_count(&self) -> usize {
        self.requests().len() + self.uploads().len() + self.summaries().len()
    }

    fn next_reply(&self, default: String) -> Result<String> {
        match self.replies.lock().unwrap().pop_front() {
            None => Ok(default),
            Some(FakeReply::Answer(text)) => Ok(text),
            Some(FakeReply::Status(status, detail)) => Err(status_error(status, &detail)),
            Some(FakeReply::Transport) => Err(anyhow::anyhow!("connection refused")),
        }
    }
}

fn answer(text: String, conversation_id: Option<&str>, language: Language) -> ChatResponse {
    ChatResponse {
        message: text,
        conversation_id: conversation_id.unwrap_or("conv_fake").to_string(),
        sources: Vec::new(),
        language,
    }
}

#[async_trait]
impl ChatService for FakeChat {
    async fn chat(&self, _token: &str, request: &ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let text = self.next_reply(format!("echo: {}", request.message))?;
        Ok(answer(
            text,
            request.conversation_id.as_deref(),
            request.language,
        ))
    }

    async fn upload(&self, _token: &str, upload: &UploadRequest<'_>) -> Result<ChatResponse> {
        self.uploads
            .lock()
            .unwrap()
            .push((upload.attachment.filename.clone(), upload.message.clone()));
        let text = self.next_reply(format!("received {}", upload.attachment.filename))?;
        Ok(answer(
            text,
            upload.conversation_id.as_deref(),
            upload.language,
        ))
    }

    async fn summarize(&self, _token: &str, request: &SummaryRequest) -> Result<SummaryResponse> {
        self.summaries.lock().unwrap().push(request.clone());
        let text = self.next_reply("summary".to_string())?;
        Ok(SummaryResponse {
            summary: text,
            language: request.language,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert!(path.exists());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: std::result::Result<(), BankchatError> =
            Err(BankchatError::Config("test error message".to_string()));
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        let result: std::result::Result<(), BankchatError> = Ok(());
        assert_error_contains(result, "error");
    }

    #[test]
    fn test_test_config() {
        let config = test_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_test_config_yaml() {
        let yaml = test_config_yaml();
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.client.language, Language::Ar);
    }

    #[tokio::test]
    async fn test_fake_chat_replays_script() {
        let chat = FakeChat::new();
        chat.push_reply(FakeReply::Status(502, "down".into()));
        let req = ChatRequest {
            message: "hi".into(),
            ..Default::default()
        };
        assert!(chat.chat("tok", &req).await.is_err());
        let resp = chat.chat("tok", &req).await.unwrap();
        assert_eq!(resp.message, "echo: hi");
        assert_eq!(chat.requests().len(), 2);
    }
}
