//! In-process mock backend for HTTP-level tests.
//!
//! A single axum fallback handler records every request and answers from a
//! scripted `(method, path) -> (status, body)` table. Guarded paths answer 401
//! until the refresh endpoint has succeeded once.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use crate::config::ClientConfig;
use crate::net::api::ApiClient;
use crate::net::endpoints::TOKEN_REFRESH;
use crate::util::navigate::RecordingNavigator;

#[derive(Clone, Debug)]
pub(crate) struct Recorded {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Clone, Default)]
pub(crate) struct MockBackend {
    inner: Arc<MockInner>,
}

#[derive(Default)]
struct MockInner {
    replies: Mutex<HashMap<(String, String), (u16, Value)>>,
    guarded: Mutex<HashSet<String>>,
    refreshed: AtomicBool,
    refresh_calls: AtomicUsize,
    refresh_status: AtomicU16,
    refresh_delay_ms: AtomicU64,
    requests: Mutex<Vec<Recorded>>,
}

impl MockBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Script the answer for `method path`.
    pub(crate) fn on(&self, method: &str, path: &str, status: u16, body: Value) -> &Self {
        self.inner
            .replies
            .lock()
            .unwrap()
            .insert((method.to_owned(), path.to_owned()), (status, body));
        self
    }

    /// Answer 401 `token_not_valid` on `path` until a refresh succeeds.
    pub(crate) fn guard(&self, path: &str) -> &Self {
        self.inner.guarded.lock().unwrap().insert(path.to_owned());
        self
    }

    pub(crate) fn fail_refresh(&self, status: u16) -> &Self {
        self.inner.refresh_status.store(status, Ordering::SeqCst);
        self
    }

    pub(crate) fn refresh_delay(&self, delay: Duration) -> &Self {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.inner.refresh_delay_ms.store(ms, Ordering::SeqCst);
        self
    }

    pub(crate) fn refresh_calls(&self) -> usize {
        self.inner.refresh_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<Recorded> {
        self.inner.requests.lock().unwrap().clone()
    }

    pub(crate) fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub(crate) fn hits(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }

    /// Serve on an ephemeral port and return the base URL.
    pub(crate) async fn spawn(&self) -> String {
        let app = Router::new().fallback(handle).with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    fn record(&self, entry: Recorded) {
        self.inner.requests.lock().unwrap().push(entry);
    }

    fn scripted(&self, method: &str, path: &str) -> Option<(u16, Value)> {
        self.inner
            .replies
            .lock()
            .unwrap()
            .get(&(method.to_owned(), path.to_owned()))
            .cloned()
    }

    fn is_guarded(&self, path: &str) -> bool {
        self.inner.guarded.lock().unwrap().contains(path)
    }

    async fn refresh(&self) -> Response {
        self.inner.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.inner.refresh_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        match self.inner.refresh_status.load(Ordering::SeqCst) {
            0 | 200 => {
                self.inner.refreshed.store(true, Ordering::SeqCst);
                reply(200, json!({}))
            }
            status => reply(status, json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" })),
        }
    }
}

async fn handle(State(mock): State<MockBackend>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let path = uri.path().to_owned();
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    mock.record(Recorded { method: method.to_string(), path: path.clone(), content_type, body });

    if path == TOKEN_REFRESH {
        return mock.refresh().await;
    }
    if mock.is_guarded(&path) && !mock.inner.refreshed.load(Ordering::SeqCst) {
        return reply(
            401,
            json!({ "detail": "Given token not valid for any token type", "code": "token_not_valid" }),
        );
    }
    match mock.scripted(method.as_str(), &path) {
        Some((status, body)) => reply(status, body),
        None => reply(404, json!({ "detail": "Not found." })),
    }
}

fn reply(status: u16, body: Value) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}

/// Client + recording navigator pointed at `base_url`.
pub(crate) fn client_for(base_url: &str) -> (ApiClient, Arc<RecordingNavigator>) {
    let config = ClientConfig::default()
        .with_base_url(base_url)
        .expect("mock base url");
    let navigator = Arc::new(RecordingNavigator::default());
    let client = ApiClient::new(&config, navigator.clone()).expect("build api client");
    (client, navigator)
}
