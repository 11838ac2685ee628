//! Proxy server lifecycle and router
//!
//! `ProxyServer::start` binds, spawns the axum server on the tokio runtime
//! and returns the bound address; `stop` signals a graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::error::ProxyError;
use super::routes;
use super::upstream::Backend;
use crate::config::ServerConfig;
use crate::error::Result;

/// Shared state handed to every route
#[derive(Clone, Debug)]
pub struct ProxyState {
    pub backend: Arc<Backend>,
    pub max_upload_bytes: usize,
}

impl ProxyState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let backend = Backend::new(
            &config.backend_url,
            Duration::from_secs(config.request_timeout_seconds),
        )?;
        Ok(Self {
            backend: Arc::new(backend),
            max_upload_bytes: config.max_upload_bytes,
        })
    }
}

fn not_allowed(allow: &'static str) -> ProxyError {
    ProxyError::MethodNotAllowed { allow }
}

/// Build the proxy router with all `/api` routes
pub fn router(state: ProxyState) -> Router {
    // Multipart and base64 JSON uploads carry encoding overhead on top of the file
    let body_limit = state.max_upload_bytes + state.max_upload_bytes / 2 + 1024 * 1024;

    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/api/auth/login",
            post(routes::login).fallback(|| async { not_allowed("POST") }),
        )
        .route(
            "/api/chat",
            post(routes::chat).fallback(|| async { not_allowed("POST") }),
        )
        .route(
            "/api/chat-summary",
            post(routes::chat_summary).fallback(|| async { not_allowed("POST") }),
        )
        .route(
            "/api/upload",
            post(routes::upload).fallback(|| async { not_allowed("POST") }),
        )
        .route(
            "/api/chat-sessions",
            get(routes::list_sessions)
                .post(routes::create_session)
                .fallback(|| async { not_allowed("GET, POST") }),
        )
        .route(
            "/api/chat-sessions/:id",
            delete(routes::delete_session).fallback(|| async { not_allowed("DELETE") }),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The API proxy server
pub struct ProxyServer {
    state: ProxyState,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl ProxyServer {
    /// Create a server for the given configuration
    ///
    /// # Errors
    ///
    /// Returns error if the backend URL is invalid.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        Ok(Self {
            state: ProxyState::new(config)?,
            shutdown_tx: None,
        })
    }

    /// Bind `addr` and serve in a background task
    ///
    /// Returns the bound address, which differs from `addr` when port 0 is
    /// requested.
    pub async fn start(&mut self, addr: SocketAddr) -> Result<SocketAddr> {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        self.shutdown_tx = Some(tx);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let app = router(self.state.clone());

        tracing::info!(
            "Proxy server listening on {} (backend: {})",
            local_addr,
            self.state.backend.base_url()
        );

        tokio::spawn(async move {
            let shutdown = async move {
                let _ = rx.await;
                tracing::info!("Proxy server shutting down");
            };
            if let Err(e) = axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!("Proxy server error: {}", e);
            }
        });

        Ok(local_addr)
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }
}
