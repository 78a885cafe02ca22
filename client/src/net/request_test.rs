use super::*;
use serde_json::json;

#[test]
fn constructors_set_method_and_path() {
    let req = ApiRequest::put("/api/client/services/1/");
    assert_eq!(req.method, Method::PUT);
    assert_eq!(req.path, "/api/client/services/1/");
    assert_eq!(req.body, RequestBody::Empty);
    assert!(!req.no_refresh);
}

#[test]
fn without_refresh_marks_request() {
    let req = ApiRequest::get("/api/client/me/").without_refresh();
    assert!(req.no_refresh);
}

#[test]
fn json_body_is_kept_for_replay() {
    let req = ApiRequest::post("/x/").json(json!({ "a": 1 }));
    let replay = req.clone();
    assert_eq!(replay.body, RequestBody::Json(json!({ "a": 1 })));
}

#[test]
fn form_part_name_covers_both_variants() {
    let file = FormPart::File {
        name: "featured_img".into(),
        filename: "cut.png".into(),
        mime: Some("image/png".into()),
        bytes: vec![1, 2, 3],
    };
    assert_eq!(file.name(), "featured_img");
    assert_eq!(FormPart::text("name", "Haircut").name(), "name");
}

#[test]
fn build_form_rejects_bad_mime() {
    let parts = vec![FormPart::File {
        name: "featured_img".into(),
        filename: "x".into(),
        mime: Some("not a mime".into()),
        bytes: Vec::new(),
    }];
    assert!(matches!(build_form(&parts), Err(ApiError::InvalidRequest(_))));
}

#[test]
fn build_form_accepts_text_and_file() {
    let parts = vec![
        FormPart::text("name", "Haircut"),
        FormPart::File { name: "featured_img".into(), filename: "a.png".into(), mime: None, bytes: vec![0] },
    ];
    assert!(build_form(&parts).is_ok());
}

#[test]
fn parse_body_handles_empty_json_and_text() {
    assert_eq!(parse_body(b""), Value::Null);
    assert_eq!(parse_body(b"  \n"), Value::Null);
    assert_eq!(parse_body(br#"{"ok":true}"#), json!({ "ok": true }));
    assert_eq!(parse_body(b"Bad Gateway"), json!("Bad Gateway"));
}

#[test]
fn response_json_decodes_typed_value() {
    #[derive(serde::Deserialize)]
    struct Msg {
        message: String,
    }
    let resp = ApiResponse { status: 201, body: json!({ "message": "Booking confirmed!" }) };
    let msg: Msg = resp.json().unwrap();
    assert_eq!(msg.message, "Booking confirmed!");
}

#[test]
fn response_json_reports_decode_error() {
    let resp = ApiResponse { status: 200, body: json!([1]) };
    let result: Result<std::collections::HashMap<String, i64>, _> = resp.json();
    assert!(matches!(result, Err(ApiError::Decode(_))));
}
