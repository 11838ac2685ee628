//! Login state and route guarding

use std::fmt;
use std::sync::Arc;

use super::api::ApiClient;
use super::models::UserInfo;
use crate::error::Result;
use crate::storage::{keys, read_json, write_json, LocalStore};

/// Client views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Chat,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::Chat => "/chat",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Token and user record held in the persisted store
#[derive(Clone)]
pub struct AuthSession {
    store: Arc<dyn LocalStore>,
}

impl AuthSession {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// The stored bearer token, if any
    ///
    /// A store read failure is logged and treated as signed out.
    pub fn token(&self) -> Option<String> {
        match self.store.get(keys::TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::error!("Failed to read token: {}", e);
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// The stored user record; a corrupt record reads as absent
    pub fn user_info(&self) -> Option<UserInfo> {
        read_json(self.store.as_ref(), keys::USER_INFO).unwrap_or_else(|e| {
            tracing::error!("Failed to read user info: {}", e);
            None
        })
    }

    /// Where the entry point sends the user
    pub fn landing_route(&self) -> Route {
        if self.is_authenticated() {
            Route::Dashboard
        } else {
            Route::Login
        }
    }

    /// Returns the redirect for a protected view, `None` if access is allowed
    pub fn guard(&self) -> Option<Route> {
        if self.is_authenticated() {
            None
        } else {
            Some(Route::Login)
        }
    }

    /// Authenticate and persist the token and user record
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty fields (no request is sent) or
    /// the API error when the credentials are rejected. Nothing is stored on
    /// failure.
    pub async fn login(&self, api: &ApiClient, username: &str, password: &str) -> Result<UserInfo> {
        let response = api.login(username, password).await?;
        self.store.set(keys::TOKEN, &response.access_token)?;
        write_json(self.store.as_ref(), keys::USER_INFO, &response.user)?;
        tracing::info!(username = %response.user.username, "Logged in");
        Ok(response.user)
    }

    /// Clear the token and user record; returns the login route
    pub fn logout(&self) -> Result<Route> {
        self.store.remove(keys::TOKEN)?;
        self.store.remove(keys::USER_INFO)?;
        tracing::info!("Logged out");
        Ok(Route::Login)
    }
}
