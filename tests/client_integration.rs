//! Chat client integration tests
//!
//! Drives `ApiClient` and `ChatController` through a running proxy in front
//! of a `wiremock` backend, with client state in a temporary SQLite store.

mod common;

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bankchat::client::models::{ChatSession, Language};
use bankchat::client::{ApiClient, AuthSession, ChatController, Outcome, Route};
use bankchat::storage::{keys, read_json, write_json, LocalStore, SqliteStorage};

const LIMIT: usize = 1024 * 1024;

async fn mount_login(backend: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_partial_json(json!({"username": "alice", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-alice",
            "token_type": "bearer",
            "user_info": {"id": 7, "username": "alice", "role": "admin"}
        })))
        .mount(backend)
        .await;
}

fn controller(api: Arc<ApiClient>, local: Arc<dyn LocalStore>) -> ChatController {
    ChatController::new(api.clone(), api, local, Language::En)
}

#[tokio::test]
async fn test_login_persists_token_across_reopen() {
    let backend = MockServer::start().await;
    mount_login(&backend).await;
    let (_proxy, api_base) = common::start_proxy(&backend.uri(), LIMIT).await;
    let (storage, tmp) = common::create_temp_storage();

    let api = ApiClient::new(&api_base, 5).unwrap();
    let auth = AuthSession::new(Arc::new(storage));
    let user = auth.login(&api, "alice", "pw").await.unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(auth.landing_route(), Route::Dashboard);

    let reopened = SqliteStorage::new_with_path(tmp.path().join("client.db")).unwrap();
    assert_eq!(
        reopened.get(keys::TOKEN).unwrap().as_deref(),
        Some("tok-alice")
    );
    let auth = AuthSession::new(Arc::new(reopened));
    assert!(auth.is_authenticated());
    assert_eq!(auth.user_info().unwrap().role, "admin");

    assert_eq!(auth.logout().unwrap(), Route::Login);
    assert!(!auth.is_authenticated());
    assert!(auth.user_info().is_none());
}

#[tokio::test]
async fn test_login_with_bad_credentials_stores_nothing() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})),
        )
        .mount(&backend)
        .await;
    let (_proxy, api_base) = common::start_proxy(&backend.uri(), LIMIT).await;
    let (storage, _tmp) = common::create_temp_storage();

    let api = ApiClient::new(&api_base, 5).unwrap();
    let auth = AuthSession::new(Arc::new(storage));
    let err = auth.login(&api, "alice", "wrong").await.unwrap_err();
    assert!(err.to_string().contains("Invalid credentials"));
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn test_chat_round_trip_through_proxy() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chat-sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sessions": []})))
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat-sessions"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "srv-1"})))
        .expect(1)
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("authorization", "Bearer tok"))
        .and(body_partial_json(json!({
            "message": "How do I open an account?",
            "conversation_id": "srv-1",
            "language": "en"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Visit any branch with your ID.",
            "conversation_id": "srv-1",
            "sources": [{"text": "Branch guide", "score": 0.8}]
        })))
        .expect(1)
        .mount(&backend)
        .await;
    let (_proxy, api_base) = common::start_proxy(&backend.uri(), LIMIT).await;
    let (storage, _tmp) = common::create_temp_storage();
    let local: Arc<dyn LocalStore> = Arc::new(storage);
    local.set(keys::TOKEN, "tok").unwrap();

    let api = Arc::new(ApiClient::new(&api_base, 5).unwrap());
    let mut chat = controller(api, local.clone());
    assert_eq!(chat.init().await, Outcome::Done);
    assert_eq!(chat.conversation_id(), Some("srv-1"));

    assert_eq!(chat.send("How do I open an account?").await, Outcome::Done);
    let messages = chat.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].text, "Visit any branch with your ID.");
    assert_eq!(
        messages[1].original_query.as_deref(),
        Some("How do I open an account?")
    );
    assert_eq!(messages[1].sources.as_ref().unwrap()[0].text, "Branch guide");

    let mirrored: Vec<ChatSession> = read_json(local.as_ref(), keys::CHAT_SESSIONS)
        .unwrap()
        .unwrap();
    assert_eq!(mirrored.len(), 1);
    assert_eq!(mirrored[0].id, "srv-1");
    assert_eq!(mirrored[0].title, "How do I open an account?");
    assert_eq!(mirrored[0].messages.len(), 2);
    assert_eq!(
        local.get(keys::CURRENT_SESSION_ID).unwrap().as_deref(),
        Some("srv-1")
    );
}

#[tokio::test]
async fn test_sessions_fall_back_to_local_mirror_when_backend_fails() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chat-sessions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "db down"})))
        .mount(&backend)
        .await;
    let (_proxy, api_base) = common::start_proxy(&backend.uri(), LIMIT).await;
    let (storage, _tmp) = common::create_temp_storage();
    let local: Arc<dyn LocalStore> = Arc::new(storage);
    local.set(keys::TOKEN, "tok").unwrap();
    write_json(
        local.as_ref(),
        keys::CHAT_SESSIONS,
        &vec![ChatSession::new("chat_1", "Saved offline")],
    )
    .unwrap();
    local.set(keys::CURRENT_SESSION_ID, "chat_1").unwrap();

    let api = Arc::new(ApiClient::new(&api_base, 5).unwrap());
    let mut chat = controller(api, local);
    assert_eq!(chat.init().await, Outcome::Done);
    assert_eq!(chat.sessions().sessions().len(), 1);
    assert_eq!(chat.current_session().unwrap().title, "Saved offline");
    assert_eq!(chat.conversation_id(), Some("chat_1"));
}

#[tokio::test]
async fn test_expired_token_redirects_to_login() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chat-sessions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .mount(&backend)
        .await;
    let (_proxy, api_base) = common::start_proxy(&backend.uri(), LIMIT).await;
    let (storage, _tmp) = common::create_temp_storage();
    let local: Arc<dyn LocalStore> = Arc::new(storage);
    local.set(keys::TOKEN, "stale").unwrap();

    let api = Arc::new(ApiClient::new(&api_base, 5).unwrap());
    let mut chat = controller(api, local);
    assert_eq!(chat.init().await, Outcome::Redirect(Route::Login));
}

#[tokio::test]
async fn test_delete_session_removes_remote_and_local() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chat-sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sessions": [
            {"id": "s1", "title": "Loans", "messages": [],
             "createdAt": "2026-01-01T00:00:00Z", "updatedAt": "2026-01-02T00:00:00Z"},
            {"id": "s2", "title": "Cards", "messages": [],
             "createdAt": "2026-01-01T00:00:00Z", "updatedAt": "2026-01-03T00:00:00Z"}
        ]})))
        .mount(&backend)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/chat-sessions/s2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backend)
        .await;
    let (_proxy, api_base) = common::start_proxy(&backend.uri(), LIMIT).await;
    let (storage, _tmp) = common::create_temp_storage();
    let local: Arc<dyn LocalStore> = Arc::new(storage);
    local.set(keys::TOKEN, "tok").unwrap();
    local.set(keys::CURRENT_SESSION_ID, "s2").unwrap();

    let api = Arc::new(ApiClient::new(&api_base, 5).unwrap());
    let mut chat = controller(api, local.clone());
    assert_eq!(chat.init().await, Outcome::Done);
    assert_eq!(chat.conversation_id(), Some("s2"));

    assert_eq!(chat.delete_session("s2").await, Outcome::Done);
    assert_eq!(chat.conversation_id(), Some("s1"));
    let mirrored: Vec<ChatSession> = read_json(local.as_ref(), keys::CHAT_SESSIONS)
        .unwrap()
        .unwrap();
    assert_eq!(mirrored.len(), 1);
    assert_eq!(mirrored[0].id, "s1");
}

#[tokio::test]
async fn test_error_without_detail_shows_default_inline_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let (storage, _tmp) = common::create_temp_storage();
    let local: Arc<dyn LocalStore> = Arc::new(storage);
    local.set(keys::TOKEN, "tok").unwrap();

    let api = Arc::new(ApiClient::new(&format!("{}/api", server.uri()), 5).unwrap());
    let mut chat = controller(api, local);
    assert_eq!(chat.send("hi").await, Outcome::Failed);

    let messages = chat.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].is_ai());
    assert_eq!(
        messages[1].text,
        "Sorry, an error occurred: Failed to get response"
    );
}

#[tokio::test]
async fn test_error_detail_is_shown_inline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"detail": "Model is warming up"})),
        )
        .mount(&server)
        .await;
    let (storage, _tmp) = common::create_temp_storage();
    let local: Arc<dyn LocalStore> = Arc::new(storage);
    local.set(keys::TOKEN, "tok").unwrap();

    let api = Arc::new(ApiClient::new(&format!("{}/api", server.uri()), 5).unwrap());
    let mut chat = controller(api, local);
    assert_eq!(chat.send("hi").await, Outcome::Failed);
    assert_eq!(
        chat.messages()[1].text,
        "Sorry, an error occurred: Model is warming up"
    );
}
