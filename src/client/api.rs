//! HTTP client for the `/api` surface of the proxy
//!
//! Every call except login sends `Authorization: Bearer <token>`. A 401
//! response maps to [`BankchatError::Unauthorized`]; any other non-success
//! status maps to [`BankchatError::Api`] carrying the body's `detail`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::attachment::Attachment;
use super::models::{ChatSession, Language};
use crate::error::{BankchatError, Result};
use crate::types::{
    ChatRequest, ChatResponse, CreateSessionRequest, CreateSessionResponse, ErrorBody,
    LoginRequest, LoginResponse, SessionsResponse, SummaryRequest, SummaryResponse,
};

/// Chat, upload and summary calls the chat controller depends on
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send a text message
    async fn chat(&self, token: &str, request: &ChatRequest) -> Result<ChatResponse>;

    /// Upload an attachment and get the assistant's reply to it
    async fn upload(&self, token: &str, upload: &UploadRequest<'_>) -> Result<ChatResponse>;

    /// Summarize a transcript
    async fn summarize(&self, token: &str, request: &SummaryRequest) -> Result<SummaryResponse>;
}

/// Remote tier of the session cache
#[async_trait]
pub trait RemoteSessions: Send + Sync {
    /// List the user's sessions
    async fn list_sessions(&self, token: &str) -> Result<Vec<ChatSession>>;

    /// Create a session and return its server-assigned id
    async fn create_session(&self, token: &str, title: &str) -> Result<String>;

    /// Delete a session
    async fn delete_session(&self, token: &str, id: &str) -> Result<()>;
}

/// A multipart upload submission
#[derive(Debug, Clone)]
pub struct UploadRequest<'a> {
    pub attachment: &'a Attachment,
    pub message: String,
    pub conversation_id: Option<String>,
    pub language: Language,
    pub filters: Vec<String>,
}

/// Client for the proxy API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for an API base such as `http://127.0.0.1:3000/api`
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use bankchat::client::ApiClient;
    ///
    /// let api = ApiClient::new("http://127.0.0.1:3000/api/", 30).unwrap();
    /// assert_eq!(api.base_url(), "http://127.0.0.1:3000/api");
    /// ```
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("bankchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BankchatError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in with a username and password
    ///
    /// Empty fields are rejected before any request is sent.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(
                BankchatError::Validation("Username and password are required".into()).into(),
            );
        }

        let body = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let request = self.client.post(self.endpoint("/auth/login")).json(&body);
        send_json(request, "login").await
    }
}

#[async_trait]
impl ChatService for ApiClient {
    async fn chat(&self, token: &str, request: &ChatRequest) -> Result<ChatResponse> {
        let builder = self
            .client
            .post(self.endpoint("/chat"))
            .bearer_auth(token)
            .json(request);
        send_json(builder, "chat").await
    }

    async fn upload(&self, token: &str, upload: &UploadRequest<'_>) -> Result<ChatResponse> {
        let attachment = upload.attachment;
        let part = Part::bytes(attachment.bytes.clone())
            .file_name(attachment.filename.clone())
            .mime_str(&attachment.mime)?;

        let mut form = Form::new()
            .part("file", part)
            .text("message", upload.message.clone())
            .text("language", upload.language.as_str());
        if let Some(id) = &upload.conversation_id {
            form = form.text("conversation_id", id.clone());
        }
        if !upload.filters.is_empty() {
            form = form.text("filters", serde_json::to_string(&upload.filters)?);
        }

        let builder = self
            .client
            .post(self.endpoint("/upload"))
            .bearer_auth(token)
            .multipart(form);
        send_json(builder, "upload").await
    }

    async fn summarize(&self, token: &str, request: &SummaryRequest) -> Result<SummaryResponse> {
        let builder = self
            .client
            .post(self.endpoint("/chat-summary"))
            .bearer_auth(token)
            .json(request);
        send_json(builder, "chat summary").await
    }
}

#[async_trait]
impl RemoteSessions for ApiClient {
    async fn list_sessions(&self, token: &str) -> Result<Vec<ChatSession>> {
        let builder = self
            .client
            .get(self.endpoint("/chat-sessions"))
            .bearer_auth(token);
        let body: SessionsResponse = send_json(builder, "list sessions").await?;
        Ok(body.sessions)
    }

    async fn create_session(&self, token: &str, title: &str) -> Result<String> {
        let builder = self
            .client
            .post(self.endpoint("/chat-sessions"))
            .bearer_auth(token)
            .json(&CreateSessionRequest {
                title: title.to_string(),
            });
        let body: CreateSessionResponse = send_json(builder, "create session").await?;
        Ok(body.id)
    }

    async fn delete_session(&self, token: &str, id: &str) -> Result<()> {
        let mut url = reqwest::Url::parse(&self.endpoint("/chat-sessions"))
            .map_err(|e| BankchatError::Config(format!("Invalid API base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| BankchatError::Config("API base URL cannot hold a path".into()))?
            .push(id);
        let builder = self.client.delete(url).bearer_auth(token);
        let response = builder.send().await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder, context: &str) -> Result<T> {
    let response = request.send().await.map_err(|e| {
        tracing::warn!("{} request failed: {}", context, e);
        BankchatError::Http(e)
    })?;
    let response = check_status(response).await?;
    let body = response.json::<T>().await.map_err(|e| {
        tracing::error!("Failed to parse {} response: {}", context, e);
        BankchatError::Http(e)
    })?;
    Ok(body)
}

/// Turn a non-success response into the matching error
async fn check_status(response: Response) -> std::result::Result<Response, BankchatError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.detail)
        .unwrap_or_default();
    tracing::debug!(
        "API returned {} {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown"),
        if detail.is_empty() { text.as_str() } else { detail.as_str() }
    );

    if status.as_u16() == 401 {
        Err(BankchatError::Unauthorized(if detail.is_empty() {
            "HTTP 401: Unauthorized".to_string()
        } else {
            detail
        }))
    } else {
        Err(BankchatError::Api {
            status: status.as_u16(),
            detail,
        })
    }
}
