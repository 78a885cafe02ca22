//! Support-assistant chat sessions.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use serde_json::{Value, json};

use super::api::ApiClient;
use super::endpoints::{self, CHAT_SESSIONS};
use super::error::{ApiError, body_str};
use super::request::ApiRequest;
use super::types::{ChatMessage, ChatSession};

#[derive(Clone)]
pub struct ChatApi {
    api: ApiClient,
}

impl ChatApi {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Propagates request and decode failures.
    pub async fn sessions(&self) -> Result<Vec<ChatSession>, ApiError> {
        self.api.get(CHAT_SESSIONS).await?.json()
    }

    /// # Errors
    ///
    /// Propagates request and decode failures.
    pub async fn create_session(&self) -> Result<ChatSession, ApiError> {
        self.api.request(&ApiRequest::post(CHAT_SESSIONS)).await?.json()
    }

    /// # Errors
    ///
    /// Propagates request and decode failures.
    pub async fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>, ApiError> {
        self.api.get(&endpoints::chat_history(session_id)).await?.json()
    }

    /// Send one user message and return the assistant's reply.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for a blank message and `Decode` when the
    /// reply carries no `response_msg`.
    pub async fn send_message(&self, session_id: &str, text: &str) -> Result<String, ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::InvalidRequest("message is empty".to_owned()));
        }
        let response = self
            .api
            .post_json(&endpoints::chat_send(session_id), json!({ "message": text }))
            .await?;
        reply_text(&response.body)
    }

    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn clear_history(&self, session_id: &str) -> Result<(), ApiError> {
        self.api.delete(&endpoints::chat_history(session_id)).await?;
        tracing::debug!(%session_id, "chat history cleared");
        Ok(())
    }
}

fn reply_text(body: &Value) -> Result<String, ApiError> {
    body_str(body, "response_msg")
        .map(ToOwned::to_owned)
        .ok_or_else(|| ApiError::Decode("chat reply missing response_msg".to_owned()))
}
