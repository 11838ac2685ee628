//! Route-level error type
//!
//! Every failure a route can produce becomes a status code plus a JSON
//! `{"detail": "..."}` body.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::types::ErrorBody;

/// Error returned by proxy route handlers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// Missing or malformed `Authorization: Bearer` header
    #[error("Authorization required")]
    Unauthorized,

    /// Request input rejected before contacting the backend
    #[error("{0}")]
    BadRequest(String),

    /// Attachment over the configured size limit
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Route does not accept the request method
    #[error("Method not allowed")]
    MethodNotAllowed {
        /// Value for the `Allow` response header
        allow: &'static str,
    },

    /// Backend answered with a non-success status; relayed unchanged
    #[error("{detail}")]
    Upstream {
        /// Backend status code
        status: u16,
        /// Backend `detail`, or the route default
        detail: String,
    },

    /// Network failure, unparseable backend body, or other local fault
    #[error("Internal server error")]
    Internal,
}

impl ProxyError {
    /// The status code this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ProxyError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log a local failure and collapse it into the generic 500
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        tracing::error!("{} error: {}", context, err);
        ProxyError::Internal
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            detail: Some(self.to_string()),
        });
        let mut response = (status, body).into_response();
        if let ProxyError::MethodNotAllowed { allow } = self {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(allow));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ProxyError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::Upstream {
                status: 404,
                detail: "Chat session not found".into()
            }
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ProxyError::Internal.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_method_not_allowed_sets_allow_header() {
        let response = ProxyError::MethodNotAllowed { allow: "GET, POST" }.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, POST");
    }

    #[test]
    fn test_detail_text() {
        assert_eq!(ProxyError::Unauthorized.to_string(), "Authorization required");
        assert_eq!(ProxyError::Internal.to_string(), "Internal server error");
    }
}
