//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_VERIFICATION_TIMEOUT_SECS: u64 = 30 * 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin without a trailing slash (e.g. `"http://localhost:8000"`).
    pub base_url: String,
    /// Route the navigator is sent to when a refresh fails with 401.
    pub login_route: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Upper bound on how long a submitted booking waits for its email link.
    pub verification_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            login_route: DEFAULT_LOGIN_ROUTE.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            verification_timeout: Duration::from_secs(DEFAULT_VERIFICATION_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `SLOTBOOK_API_URL`: default `http://localhost:8000`
    /// - `SLOTBOOK_LOGIN_ROUTE`: default `/login`
    /// - `SLOTBOOK_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SLOTBOOK_CONNECT_TIMEOUT_SECS`: default 10
    /// - `SLOTBOOK_VERIFICATION_TIMEOUT_SECS`: default 1800
    ///
    /// # Errors
    ///
    /// Returns an error if `SLOTBOOK_API_URL` is not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("SLOTBOOK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let login_route = std::env::var("SLOTBOOK_LOGIN_ROUTE")
            .ok()
            .filter(|route| !route.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOGIN_ROUTE.to_owned());

        Ok(Self {
            base_url: normalize_base_url(&base_url)?,
            login_route,
            request_timeout: Duration::from_secs(env_parse("SLOTBOOK_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)),
            connect_timeout: Duration::from_secs(env_parse("SLOTBOOK_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)),
            verification_timeout: Duration::from_secs(env_parse(
                "SLOTBOOK_VERIFICATION_TIMEOUT_SECS",
                DEFAULT_VERIFICATION_TIMEOUT_SECS,
            )),
        })
    }

    /// Same config pointed at another backend origin.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an http(s) URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }
}

/// Trimmed origin without trailing slashes. Must parse as an http(s) URL
/// with a host.
pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = || ConfigError::InvalidBaseUrl(raw.to_owned());
    let url = reqwest::Url::parse(trimmed).map_err(|_| invalid())?;
    let has_host = url.host_str().is_some_and(|host| !host.is_empty());
    if matches!(url.scheme(), "http" | "https") && has_host {
        Ok(trimmed.to_owned())
    } else {
        Err(invalid())
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
