//! Proxy route handlers
//!
//! One handler per backend endpoint. Handlers check the bearer token and
//! the input, forward to the backend, and reshape the JSON result.

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use serde::de::DeserializeOwned;

use super::error::ProxyError;
use super::server::ProxyState;
use super::upstream::{read_json, relay, upstream_error};
use crate::client::i18n;
use crate::client::models::Language;
use crate::types::{
    ChatRequest, DocumentUpload, JsonUploadRequest, LoginRequest, LoginResponse,
    UpstreamChatResponse,
};

type RouteResult = std::result::Result<Response, ProxyError>;

/// Extract the `Authorization` header, which must be a bearer token
pub fn bearer_header(headers: &HeaderMap) -> std::result::Result<String, ProxyError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("Bearer "))
        .map(str::to_string)
        .ok_or(ProxyError::Unauthorized)
}

fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> std::result::Result<T, ProxyError> {
    if body.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        ProxyError::BadRequest("Invalid JSON body".to_string())
    })
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn login(State(state): State<ProxyState>, body: Bytes) -> RouteResult {
    let credentials: LoginRequest = parse_body(&body)?;
    if credentials.username.is_empty() || credentials.password.is_empty() {
        return Err(ProxyError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    tracing::info!(username = %credentials.username, "Forwarding login");
    let response = state
        .backend
        .post_json(&["auth", "login"], None, &credentials)
        .await?;

    if !response.status().is_success() {
        return Err(upstream_error(response, "Authentication failed").await);
    }

    let login: LoginResponse = read_json(response, "Login API").await?;
    Ok((StatusCode::OK, Json(login)).into_response())
}

pub async fn chat(State(state): State<ProxyState>, headers: HeaderMap, body: Bytes) -> RouteResult {
    let auth = bearer_header(&headers)?;
    let request: ChatRequest = parse_body(&body)?;
    if request.message.trim().is_empty() {
        return Err(ProxyError::BadRequest("Message is required".to_string()));
    }

    let response = state
        .backend
        .post_json(&["chat"], Some(&auth), &request)
        .await?;
    if !response.status().is_success() {
        return Err(upstream_error(response, "Chat request failed").await);
    }

    let upstream: UpstreamChatResponse = read_json(response, "Chat API").await?;
    let canonical = upstream.into_canonical(request.conversation_id.as_deref(), request.language);
    Ok((StatusCode::OK, Json(canonical)).into_response())
}

pub async fn chat_summary(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Bytes,
) -> RouteResult {
    let auth = bearer_header(&headers)?;
    let payload: serde_json::Value = if body.is_empty() {
        serde_json::json!({})
    } else {
        parse_body::<Option<serde_json::Value>>(&body)?.unwrap_or_else(|| serde_json::json!({}))
    };

    let response = state
        .backend
        .post_json(&["chat-summary"], Some(&auth), &payload)
        .await?;
    if !response.status().is_success() {
        return Err(upstream_error(response, "Chat summary request failed").await);
    }

    let summary: serde_json::Value = read_json(response, "chat-summary API").await?;
    Ok((StatusCode::OK, Json(summary)).into_response())
}

/// A file plus the chat fields that came with it
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    message: String,
    conversation_id: Option<String>,
    language: Language,
    filters: Vec<String>,
}

#[derive(Debug)]
struct UploadedFile {
    filename: String,
    mime: Option<String>,
    bytes: Vec<u8>,
}

impl UploadedFile {
    /// Text files travel as-is; binaries as a tagged base64 block
    fn into_content(self) -> (String, String) {
        let mime = self.mime.unwrap_or_else(|| {
            mime_guess::from_path(&self.filename)
                .first_or_octet_stream()
                .to_string()
        });
        let content = match String::from_utf8(self.bytes) {
            Ok(text) => text,
            Err(err) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(err.into_bytes());
                format!("[binary:{};base64]\n{}", mime, encoded)
            }
        };
        (self.filename, content)
    }
}

fn parse_language(raw: Option<&str>) -> Language {
    raw.and_then(|l| l.parse().ok()).unwrap_or_default()
}

/// A JSON array of tags, or a comma-separated list; blanks dropped
fn split_filters(raw: &str) -> Vec<String> {
    if let Ok(tags) = serde_json::from_str::<Vec<String>>(raw) {
        return tags.into_iter().filter(|t| !t.trim().is_empty()).collect();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

async fn read_multipart(
    mut multipart: Multipart,
    max_bytes: usize,
) -> std::result::Result<UploadForm, ProxyError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ProxyError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let mime = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ProxyError::BadRequest(format!("Failed to read file data: {}", e)))?;
                if bytes.len() > max_bytes {
                    return Err(too_large(max_bytes));
                }
                form.file = Some(UploadedFile {
                    filename,
                    mime,
                    bytes: bytes.to_vec(),
                });
            }
            "message" => form.message = field.text().await.unwrap_or_default(),
            "conversation_id" => {
                form.conversation_id = non_empty(field.text().await.ok());
            }
            "language" => form.language = parse_language(field.text().await.ok().as_deref()),
            "filters" => form.filters = split_filters(&field.text().await.unwrap_or_default()),
            _ => {}
        }
    }

    Ok(form)
}

fn too_large(max_bytes: usize) -> ProxyError {
    ProxyError::PayloadTooLarge(format!(
        "File too large. Maximum {}MB allowed.",
        max_bytes / (1024 * 1024)
    ))
}

/// Upload a document, then run a chat turn so the client gets a reply
///
/// Accepts `multipart/form-data` (field `file`) or a JSON body with
/// `filename` and `content`.
pub async fn upload(State(state): State<ProxyState>, request: Request) -> RouteResult {
    let auth = bearer_header(request.headers())?;

    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false);

    let (filename, content, message, conversation_id, language, filters) = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ProxyError::BadRequest(e.body_text()))?;
        let form = read_multipart(multipart, state.max_upload_bytes).await?;
        let file = form
            .file
            .ok_or_else(|| ProxyError::BadRequest("No file uploaded".to_string()))?;
        let (filename, content) = file.into_content();
        (
            filename,
            content,
            form.message,
            form.conversation_id,
            form.language,
            form.filters,
        )
    } else {
        let body = Bytes::from_request(request, &state)
            .await
            .map_err(|e| ProxyError::BadRequest(e.body_text()))?;
        let upload: JsonUploadRequest = serde_json::from_slice(&body)
            .map_err(|_| ProxyError::BadRequest("No file uploaded".to_string()))?;
        if upload.content.len() > state.max_upload_bytes {
            return Err(too_large(state.max_upload_bytes));
        }
        (
            upload.filename,
            upload.content,
            upload.message.unwrap_or_default(),
            non_empty(upload.conversation_id),
            parse_language(upload.language.as_deref()),
            upload.filters,
        )
    };

    tracing::info!(filename = %filename, bytes = content.len(), "Forwarding document upload");
    let document = DocumentUpload {
        filename,
        content,
        classification: "public".to_string(),
    };
    let response = state
        .backend
        .post_json(&["documents", "upload"], Some(&auth), &document)
        .await?;
    if !response.status().is_success() {
        return Err(upstream_error(response, "File upload failed").await);
    }

    let message = if message.trim().is_empty() {
        i18n::file_uploaded(language).to_string()
    } else {
        message
    };
    let chat_request = ChatRequest {
        message,
        conversation_id: conversation_id.clone(),
        language,
        filters: (!filters.is_empty()).then_some(filters),
        ..Default::default()
    };
    let response = state
        .backend
        .post_json(&["chat"], Some(&auth), &chat_request)
        .await?;
    if !response.status().is_success() {
        return Err(upstream_error(response, "Chat request after upload failed").await);
    }

    let upstream: UpstreamChatResponse = read_json(response, "Upload API").await?;
    let canonical = upstream.into_canonical(conversation_id.as_deref(), language);
    Ok((StatusCode::OK, Json(canonical)).into_response())
}

pub async fn list_sessions(State(state): State<ProxyState>, headers: HeaderMap) -> RouteResult {
    let auth = bearer_header(&headers)?;
    let response = state.backend.get(&["chat-sessions"], &auth).await?;
    Ok(relay(response).await)
}

pub async fn create_session(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Bytes,
) -> RouteResult {
    let auth = bearer_header(&headers)?;
    let payload: serde_json::Value = if body.is_empty() {
        serde_json::json!({})
    } else {
        parse_body::<Option<serde_json::Value>>(&body)?.unwrap_or_else(|| serde_json::json!({}))
    };
    let response = state
        .backend
        .post_json(&["chat-sessions"], Some(&auth), &payload)
        .await?;
    Ok(relay(response).await)
}

pub async fn delete_session(
    State(state): State<ProxyState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> RouteResult {
    let auth = bearer_header(&headers)?;
    if id.trim().is_empty() {
        return Err(ProxyError::BadRequest("Invalid session id".to_string()));
    }

    let response = state
        .backend
        .delete(&["chat-sessions", id.as_str()], &auth)
        .await?;
    if response.status().as_u16() == 204 {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(relay(response).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_header_required() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_header(&headers), Err(ProxyError::Unauthorized));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_header(&headers), Err(ProxyError::Unauthorized));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        assert_eq!(bearer_header(&headers).unwrap(), "Bearer tok");
    }

    #[test]
    fn test_text_upload_content_is_verbatim() {
        let file = UploadedFile {
            filename: "notes.txt".into(),
            mime: Some("text/plain".into()),
            bytes: b"policy text".to_vec(),
        };
        let (name, content) = file.into_content();
        assert_eq!(name, "notes.txt");
        assert_eq!(content, "policy text");
    }

    #[test]
    fn test_binary_upload_content_is_tagged_base64() {
        let file = UploadedFile {
            filename: "scan.png".into(),
            mime: None,
            bytes: vec![0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe],
        };
        let (_, content) = file.into_content();
        assert!(content.starts_with("[binary:image/png;base64]\n"));
        assert!(content.ends_with("iVBOR//+"));
    }

    #[test]
    fn test_parse_language_defaults_to_english() {
        assert_eq!(parse_language(Some("ar")), Language::Ar);
        assert_eq!(parse_language(Some("de")), Language::En);
        assert_eq!(parse_language(None), Language::En);
    }
}
