use super::*;
use crate::test_helpers::{MockBackend, client_for};

#[test]
fn reply_text_requires_response_msg() {
    assert_eq!(reply_text(&json!({ "response_msg": "Hello!" })).unwrap(), "Hello!");
    assert!(matches!(reply_text(&json!({ "message": "x" })), Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn send_message_returns_reply() {
    let mock = MockBackend::new();
    mock.on("POST", "/api/chat/s1/send-msg/", 200, json!({ "response_msg": "Try Tuesday at 10:00." }));
    let (api, _) = client_for(&mock.spawn().await);

    let reply = ChatApi::new(api).send_message("s1", "  when are you free? ").await.expect("reply");
    assert_eq!(reply, "Try Tuesday at 10:00.");
    assert_eq!(mock.requests_to("/api/chat/s1/send-msg/")[0].body, json!({ "message": "when are you free?" }));
}

#[tokio::test]
async fn blank_message_is_not_sent() {
    let mock = MockBackend::new();
    let (api, _) = client_for(&mock.spawn().await);

    let err = ChatApi::new(api).send_message("s1", "   ").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn sessions_and_history_decode() {
    let mock = MockBackend::new();
    mock.on("GET", CHAT_SESSIONS, 200, json!([{ "id": 4, "started_at": "2026-10-19T09:00:00Z", "last_message": "hi" }]))
        .on("GET", "/api/chat/4/history/", 200, json!([
            { "id": 1, "message": "hi", "sender": "user" },
            { "id": 2, "message": "Hello!", "sender": "bot" }
        ]));
    let (api, _) = client_for(&mock.spawn().await);
    let chat = ChatApi::new(api);

    let sessions = chat.sessions().await.expect("sessions");
    assert_eq!(sessions[0].id, "4");
    let history = chat.history(&sessions[0].id).await.expect("history");
    assert_eq!(history[1].sender, "bot");
}

#[tokio::test]
async fn create_session_and_clear_history() {
    let mock = MockBackend::new();
    mock.on("POST", CHAT_SESSIONS, 201, json!({ "id": 9 }))
        .on("DELETE", "/api/chat/9/history/", 200, Value::Null);
    let (api, _) = client_for(&mock.spawn().await);
    let chat = ChatApi::new(api);

    let session = chat.create_session().await.expect("session");
    assert_eq!(session.id, "9");
    chat.clear_history(&session.id).await.expect("clear");
    assert_eq!(mock.hits("/api/chat/9/history/"), 1);
}
