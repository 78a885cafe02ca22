//! Session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route guards and front ends read [`AuthState`] to decide what to render.
//! The state lives in a `watch` channel so any number of observers can await
//! changes without a UI framework. Only the operations on [`Session`] change
//! it, and they are also the only code that toggles the API client's
//! skip-refresh marker.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::watch;

use crate::net::api::ApiClient;
use crate::net::endpoints::{
    CHECK_AUTH, GOOGLE_OAUTH, LOGIN, LOGOUT, REGISTER, RESEND_CODE, TOKEN_REFRESH, VERIFY_CODE,
};
use crate::net::error::{ApiError, MISSING_REFRESH_COOKIE, NO_TOKEN_FOUND, body_str, message_from_body};
use crate::net::request::ApiRequest;
use crate::net::types::{CheckAuthResponse, Credentials, Registration};

pub const LOGIN_FAILED: &str = "Login failed";
pub const GOOGLE_LOGIN_FAILED: &str = "Google login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";
pub const VERIFICATION_FAILED: &str = "Verification failed";

/// Observable authentication state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthState {
    pub is_authenticated: bool,
    /// True until the first `check_auth` finishes.
    pub loading: bool,
    /// Last user-facing auth error.
    pub error: Option<String>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self { is_authenticated: false, loading: true, error: None }
    }
}

/// Process-wide session bound to one [`ApiClient`].
#[derive(Clone)]
pub struct Session {
    api: ApiClient,
    state: Arc<watch::Sender<AuthState>>,
}

impl Session {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let (tx, _rx) = watch::channel(AuthState::default());
        Self { api, state: Arc::new(tx) }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    /// Probe the backend for an existing session. Never fails; any error
    /// counts as "not authenticated". Clears `loading`.
    ///
    /// The probe bypasses the refresh interceptor: an expired session is
    /// refreshed here, and a failed refresh only leaves the visitor anonymous
    /// instead of sending them to the login route.
    pub async fn check_auth(&self) -> bool {
        let probe = ApiRequest::get(CHECK_AUTH).without_refresh();
        let authenticated = match self.api.request(&probe).await {
            Ok(response) => match response.json::<CheckAuthResponse>() {
                Ok(body) => {
                    if let Some(error) = body.error.as_deref().filter(|_| !body.is_authenticated) {
                        tracing::debug!(%error, "no active session");
                    }
                    body.is_authenticated
                }
                Err(error) => {
                    tracing::warn!(error = %error, "unreadable check-auth response");
                    false
                }
            },
            Err(error) if error.body().and_then(|b| body_str(b, "error")) == Some(NO_TOKEN_FOUND) => {
                tracing::debug!("no token found; refresh disabled until login");
                false
            }
            Err(error)
                if error.is_unauthorized()
                    || error.body().and_then(|b| body_str(b, "error")) == Some(MISSING_REFRESH_COOKIE) =>
            {
                tracing::debug!(error = %error, "session expired; refreshing");
                self.refresh_session().await
            }
            Err(error) => {
                tracing::warn!(error = %error, "auth check failed");
                false
            }
        };

        self.set_authenticated(authenticated);
        self.state.send_modify(|state| state.loading = false);
        authenticated
    }

    /// Log in with email and password and return the server payload.
    ///
    /// # Errors
    ///
    /// Returns the API failure; `AuthState::error` receives the server's
    /// message (or "Login failed").
    pub async fn login(&self, credentials: &Credentials) -> Result<Value, ApiError> {
        let body = serde_json::to_value(credentials)?;
        match self.api.post_json(LOGIN, body).await {
            Ok(response) => {
                tracing::info!(email = %credentials.email, "logged in");
                self.set_authenticated(true);
                Ok(response.body)
            }
            Err(error) => Err(self.fail(error, LOGIN_FAILED)),
        }
    }

    /// Exchange a Google identity credential for a session.
    ///
    /// # Errors
    ///
    /// Returns the API failure; `AuthState::error` is set.
    pub async fn login_with_google(&self, credential: &str) -> Result<Value, ApiError> {
        match self.api.post_json(GOOGLE_OAUTH, json!({ "token": credential })).await {
            Ok(response) => {
                tracing::info!("logged in with google");
                self.set_authenticated(true);
                Ok(response.body)
            }
            Err(error) => Err(self.fail(error, GOOGLE_LOGIN_FAILED)),
        }
    }

    /// End the session. The server call is best effort; locally the session is
    /// always cleared.
    pub async fn logout(&self) {
        if let Err(error) = self.api.request(&ApiRequest::post(LOGOUT).without_refresh()).await {
            tracing::warn!(error = %error, "logout request failed");
        }
        self.set_authenticated(false);
    }

    /// Create an inactive account; the server emails a verification code.
    /// Returns the server's confirmation text.
    ///
    /// # Errors
    ///
    /// Returns the API failure; `AuthState::error` is set.
    pub async fn register(&self, registration: &Registration) -> Result<String, ApiError> {
        let body = serde_json::to_value(registration)?;
        match self.api.post_json(REGISTER, body).await {
            Ok(response) => Ok(message_from_body(&response.body)
                .unwrap_or_else(|| format!("Verification code was sent to {}!", registration.email))),
            Err(error) => Err(self.fail(error, REGISTRATION_FAILED)),
        }
    }

    /// Submit the emailed code, then log in with the new account.
    ///
    /// # Errors
    ///
    /// Returns the verify or login failure; `AuthState::error` is set.
    pub async fn verify_registration(&self, email: &str, code: &str, password: &str) -> Result<Value, ApiError> {
        let body = json!({ "email": email, "verification_code": code.trim() });
        if let Err(error) = self.api.post_json(VERIFY_CODE, body).await {
            return Err(self.fail(error, VERIFICATION_FAILED));
        }
        self.login(&Credentials { email: email.to_owned(), password: password.to_owned() })
            .await
    }

    /// Ask for a fresh verification code.
    ///
    /// # Errors
    ///
    /// Returns the API failure.
    pub async fn resend_code(&self, email: &str) -> Result<Option<String>, ApiError> {
        let response = self.api.post_json(RESEND_CODE, json!({ "email": email })).await?;
        Ok(message_from_body(&response.body))
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|state| state.error = None);
    }

    async fn refresh_session(&self) -> bool {
        let refresh = ApiRequest::post(TOKEN_REFRESH).without_refresh();
        match self.api.request(&refresh).await {
            Ok(_) => true,
            Err(error) => {
                tracing::debug!(error = %error, "session refresh rejected");
                false
            }
        }
    }

    fn set_authenticated(&self, authenticated: bool) {
        self.api.set_skip_refresh(!authenticated);
        self.state.send_modify(|state| {
            state.is_authenticated = authenticated;
            if authenticated {
                state.error = None;
            }
        });
    }

    fn fail(&self, error: ApiError, fallback: &str) -> ApiError {
        let message = error.display_message(fallback);
        tracing::warn!(error = %error, %message, "auth request failed");
        self.state.send_modify(|state| state.error = Some(message));
        error
    }
}
