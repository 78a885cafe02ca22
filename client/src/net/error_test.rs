use super::*;
use serde_json::json;

fn status(status: u16, body: Value) -> ApiError {
    ApiError::Status { status, body }
}

#[test]
fn message_from_body_prefers_message_field() {
    let body = json!({ "message": "Invalid credentials", "error": "other" });
    assert_eq!(message_from_body(&body).as_deref(), Some("Invalid credentials"));
}

#[test]
fn message_from_body_falls_back_to_error_then_detail() {
    assert_eq!(message_from_body(&json!({ "error": "Time slot already booked." })).as_deref(), Some("Time slot already booked."));
    assert_eq!(message_from_body(&json!({ "detail": "Not found." })).as_deref(), Some("Not found."));
}

#[test]
fn message_from_body_skips_blank_message() {
    let body = json!({ "message": "  ", "error": "real" });
    assert_eq!(message_from_body(&body).as_deref(), Some("real"));
}

#[test]
fn message_from_body_reads_serializer_field_errors() {
    let body = json!({ "customer_email": ["Enter a valid email address."] });
    assert_eq!(message_from_body(&body).as_deref(), Some("Enter a valid email address."));
}

#[test]
fn message_from_body_none_for_non_object() {
    assert_eq!(message_from_body(&json!(null)), None);
    assert_eq!(message_from_body(&json!([1, 2])), None);
}

#[test]
fn status_and_body_look_through_refresh_failure() {
    let err = ApiError::RefreshFailed(Box::new(status(401, json!({ "detail": "expired" }))));
    assert_eq!(err.status(), Some(401));
    assert!(err.is_unauthorized());
    assert_eq!(err.server_message().as_deref(), Some("expired"));
}

#[test]
fn retry_exhausted_reports_unauthorized() {
    let err = ApiError::RetryExhausted { body: json!({}) };
    assert!(err.is_unauthorized());
    assert_eq!(err.server_message(), None);
}

#[test]
fn display_message_uses_fallback_without_body() {
    assert_eq!(ApiError::RefreshAbandoned.display_message("Login failed"), "Login failed");
    assert_eq!(ApiError::Decode("bad".into()).status(), None);
}

#[test]
fn status_error_display_includes_code_and_body() {
    let err = status(404, json!({ "detail": "Not found." }));
    let rendered = err.to_string();
    assert!(rendered.contains("HTTP 404"));
    assert!(rendered.contains("Not found."));
}

#[test]
fn serde_error_converts_to_decode() {
    let err: ApiError = serde_json::from_str::<Value>("{").unwrap_err().into();
    assert!(matches!(err, ApiError::Decode(_)));
}
