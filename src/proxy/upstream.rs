//! Backend client used by the proxy routes
//!
//! Wraps one shared `reqwest::Client` and the backend base URL. Status codes
//! cross from reqwest to axum as plain `u16` values.

use std::time::Duration;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Serialize};

use super::error::ProxyError;
use crate::error::{BankchatError, Result};

/// Handle on the backend service
#[derive(Clone, Debug)]
pub struct Backend {
    client: Client,
    base_url: Url,
}

impl Backend {
    /// Create a backend handle
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `base_url` is not an absolute
    /// http(s) URL, or if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BankchatError::Config(format!("Invalid backend URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(BankchatError::Config(format!(
                "Backend URL cannot be used as a base: {}",
                base_url
            ))
            .into());
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        authorization: Option<&str>,
        body: &T,
    ) -> std::result::Result<reqwest::Response, ProxyError> {
        let url = self.url(segments);
        tracing::debug!(%url, "POST to backend");
        let mut request = self.client.post(url).json(body);
        if let Some(auth) = authorization {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }
        request
            .send()
            .await
            .map_err(|e| ProxyError::internal("Backend request", e))
    }

    pub async fn get(
        &self,
        segments: &[&str],
        authorization: &str,
    ) -> std::result::Result<reqwest::Response, ProxyError> {
        let url = self.url(segments);
        tracing::debug!(%url, "GET from backend");
        self.client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| ProxyError::internal("Backend request", e))
    }

    pub async fn delete(
        &self,
        segments: &[&str],
        authorization: &str,
    ) -> std::result::Result<reqwest::Response, ProxyError> {
        let url = self.url(segments);
        tracing::debug!(%url, "DELETE on backend");
        self.client
            .delete(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| ProxyError::internal("Backend request", e))
    }
}

/// Turn a non-success backend response into a relayed error
///
/// Uses the body's `detail` when present, `default_detail` otherwise.
pub async fn upstream_error(response: reqwest::Response, default_detail: &str) -> ProxyError {
    let status = response.status().as_u16();
    let detail = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| {
            body.get("detail")
                .and_then(|d| d.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| default_detail.to_string());
    tracing::warn!(status, detail = %detail, "Backend returned an error");
    ProxyError::Upstream { status, detail }
}

/// Decode a success body
pub async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    context: &str,
) -> std::result::Result<T, ProxyError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ProxyError::internal(context, e))
}

/// Relay a backend response as-is: same status, JSON body or `{}`
pub async fn relay(response: reqwest::Response) -> Response {
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let body = response
        .json::<serde_json::Value>()
        .await
        .unwrap_or_else(|_| serde_json::json!({}));
    (status, Json(body)).into_response()
}
