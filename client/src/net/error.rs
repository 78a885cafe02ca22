//! API failure taxonomy surfaced to callers.
//!
//! ERROR HANDLING
//! ==============
//! Non-auth HTTP failures pass through verbatim (status + JSON body) so pages
//! can show the server's own message. Auth-expired failures never reach the
//! caller unless the shared refresh itself fails or the replay is rejected.
//! The type is `Clone` because one refresh failure is handed to every request
//! queued behind it.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use std::sync::Arc;

use serde_json::Value;

pub const NO_TOKEN_FOUND: &str = "No token found";
pub const MISSING_REFRESH_COOKIE: &str = "refresh_token doesn't exist in cookies";

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),
    #[error("session expired and token refresh failed: {0}")]
    RefreshFailed(Box<ApiError>),
    #[error("token refresh was abandoned before it settled")]
    RefreshAbandoned,
    #[error("session expired and the request was rejected again after refresh")]
    RetryExhausted { body: Value },
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: Value },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(Arc::new(error))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

impl ApiError {
    /// HTTP status carried by this failure, looking through refresh wrappers.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RetryExhausted { .. } => Some(401),
            Self::RefreshFailed(inner) => inner.status(),
            _ => None,
        }
    }

    /// Response body carried by this failure, looking through refresh wrappers.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } | Self::RetryExhausted { body } => Some(body),
            Self::RefreshFailed(inner) => inner.body(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Human-readable message supplied by the server, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        self.body().and_then(message_from_body)
    }

    /// Server message, or `fallback` when the server sent none.
    #[must_use]
    pub fn display_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or_else(|| fallback.to_owned())
    }
}

/// String field of a JSON object body.
pub(crate) fn body_str<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}

/// First non-empty of `message`, `error`, `detail`.
///
/// Django REST serializers answer with `{"field": ["msg", ...]}`; when none of
/// the well-known keys exist, the first such field message is used.
#[must_use]
pub fn message_from_body(body: &Value) -> Option<String> {
    for key in ["message", "error", "detail"] {
        if let Some(text) = body_str(body, key).filter(|text| !text.trim().is_empty()) {
            return Some(text.to_owned());
        }
    }

    body.as_object()?
        .values()
        .find_map(|value| value.as_array()?.first()?.as_str().map(ToOwned::to_owned))
}
