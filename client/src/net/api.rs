//! REST client with transparent single-flight token refresh.
//!
//! ARCHITECTURE
//! ============
//! Every call goes through [`ApiClient::request`]. Credentials travel as
//! cookies in the client's own jar. When a call fails with 401 and is eligible
//! for refresh, the client refreshes the access token once (shared by every
//! request that failed meanwhile, see `refresh.rs`) and replays the original
//! call exactly once.
//!
//! ERROR HANDLING
//! ==============
//! Non-refreshable failures come back verbatim as `ApiError::Status`. A failed
//! refresh is returned as `RefreshFailed` to the leader and to every queued
//! request; a 401 from the refresh endpoint also sends the navigator to the
//! login route. A replay that is rejected again yields `RetryExhausted`.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;

use super::endpoints::{self, TOKEN_REFRESH};
use super::error::{ApiError, MISSING_REFRESH_COOKIE, NO_TOKEN_FOUND, body_str};
use super::refresh::{self, RefreshGate, Ticket};
use super::request::{ApiRequest, ApiResponse, RequestBody, build_form, parse_body};
use crate::config::ClientConfig;
use crate::util::navigate::Navigator;

/// Shared handle to the backend. Cloning is cheap and shares the cookie jar,
/// the refresh gate and the skip-refresh marker.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiInner>,
}

struct ApiInner {
    http: reqwest::Client,
    cookies: Arc<Jar>,
    base_url: String,
    login_route: String,
    /// Set by the session layer while no session exists.
    skip_refresh: AtomicBool,
    gate: RefreshGate,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Build a client for `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, navigator: Arc<dyn Navigator>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::clone(&cookies))
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiInner {
                http,
                cookies,
                base_url: config.base_url.trim_end_matches('/').to_owned(),
                login_route: config.login_route.clone(),
                skip_refresh: AtomicBool::new(false),
                gate: RefreshGate::default(),
                navigator,
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Store a cookie for the API origin (e.g. a saved `refresh_token`).
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be parsed.
    pub fn seed_cookie(&self, name: &str, value: &str) -> Result<(), ApiError> {
        let url = self
            .inner
            .base_url
            .parse::<reqwest::Url>()
            .map_err(|e| ApiError::InvalidRequest(format!("invalid base URL: {e}")))?;
        self.inner
            .cookies
            .add_cookie_str(&format!("{name}={value}; Path=/"), &url);
        Ok(())
    }

    /// Whether the session layer currently disables refresh for all requests.
    #[must_use]
    pub fn skip_refresh(&self) -> bool {
        self.inner.skip_refresh.load(Ordering::Acquire)
    }

    pub(crate) fn set_skip_refresh(&self, skip: bool) {
        self.inner.skip_refresh.store(skip, Ordering::Release);
    }

    #[must_use]
    pub fn refresh_in_progress(&self) -> bool {
        self.inner.gate.in_progress()
    }

    /// `GET path`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request(&ApiRequest::get(path)).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post_json(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.request(&ApiRequest::post(path).json(body)).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put_json(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.request(&ApiRequest::put(path).json(body)).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request(&ApiRequest::delete(path)).await
    }

    /// Send `req`, refreshing the access token and replaying once if needed.
    ///
    /// # Errors
    ///
    /// - `Network` when the backend cannot be reached
    /// - `Status` for any non-2xx answer that is not recovered by refresh
    /// - `RefreshFailed` / `RefreshAbandoned` when the shared refresh fails
    /// - `RetryExhausted` when the replay after a successful refresh gets 401
    pub async fn request(&self, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let response = self.send_once(req).await?;
        if is_success(response.status) {
            return Ok(response);
        }

        let ApiResponse { status, body } = response;
        if !should_refresh(req, status, &body, self.skip_refresh()) {
            return Err(ApiError::Status { status, body });
        }
        self.refresh_and_replay(req).await
    }

    async fn refresh_and_replay(&self, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
        match self.inner.gate.acquire() {
            Ticket::Follower(rx) => {
                tracing::debug!(path = %req.path, "awaiting in-flight token refresh");
                refresh::wait(rx).await?;
                self.replay(req).await
            }
            Ticket::Leader(lease) => {
                tracing::info!(path = %req.path, "access token expired; refreshing");
                let outcome = self
                    .refresh_token()
                    .await
                    .map_err(|error| ApiError::RefreshFailed(Box::new(error)));
                lease.settle(&outcome);

                if let Err(error) = outcome {
                    tracing::warn!(error = %error, "token refresh failed");
                    if error.is_unauthorized() {
                        self.inner.navigator.redirect(&self.inner.login_route);
                    }
                    return Err(error);
                }
                self.replay(req).await
            }
        }
    }

    async fn refresh_token(&self) -> Result<(), ApiError> {
        let response = self
            .send_once(&ApiRequest::post(TOKEN_REFRESH).without_refresh())
            .await?;
        if is_success(response.status) {
            return Ok(());
        }
        Err(ApiError::Status { status: response.status, body: response.body })
    }

    async fn replay(&self, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let response = self.send_once(req).await?;
        match response.status {
            status if is_success(status) => Ok(response),
            401 => Err(ApiError::RetryExhausted { body: response.body }),
            status => Err(ApiError::Status { status, body: response.body }),
        }
    }

    /// One HTTP round trip with no interception. Any status is returned.
    async fn send_once(&self, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.inner.base_url, req.path);
        let builder = self.inner.http.request(req.method.clone(), &url);
        let builder = match &req.body {
            RequestBody::Empty => builder,
            RequestBody::Json(json) => builder.json(json),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        let response = builder.send().await.inspect_err(|error| {
            tracing::error!(method = %req.method, path = %req.path, error = %error, "request failed");
        })?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        tracing::debug!(method = %req.method, path = %req.path, status, "api response");

        Ok(ApiResponse { status, body: parse_body(&bytes) })
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Whether a failed request may trigger (or wait for) a token refresh.
pub(crate) fn should_refresh(req: &ApiRequest, status: u16, body: &Value, skip_marker: bool) -> bool {
    if status != 401 || req.no_refresh || skip_marker {
        return false;
    }
    if endpoints::is_refresh_endpoint(&req.path) || endpoints::is_credential_endpoint(&req.path) {
        return false;
    }

    let error = body_str(body, "error");
    if error == Some(MISSING_REFRESH_COOKIE) {
        return false;
    }
    !(endpoints::is_check_auth_endpoint(&req.path) && error == Some(NO_TOKEN_FOUND))
}
