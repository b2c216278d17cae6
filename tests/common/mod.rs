//! Stub Slack endpoint and fixtures shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use gh_slack_notify::{DeliveryResult, NotifyError, Result, WebhookTransport};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// A request captured by the stub endpoint.
#[derive(Debug, Clone)]
pub struct Received {
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    delay: Duration,
    received: Arc<Mutex<Vec<Received>>>,
}

/// Local HTTP server answering every POST with a fixed status.
pub struct StubEndpoint {
    pub url: String,
    received: Arc<Mutex<Vec<Received>>>,
}

impl StubEndpoint {
    pub async fn start(status: StatusCode) -> Self {
        Self::start_with_delay(status, Duration::ZERO).await
    }

    pub async fn start_with_delay(status: StatusCode, delay: Duration) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            status,
            delay,
            received: received.clone(),
        };
        let app = Router::new()
            .route("/hook", post(stub_hook))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}/hook", addr),
            received,
        }
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

async fn stub_hook(State(state): State<StubState>, headers: HeaderMap, body: Bytes) -> (StatusCode, String) {
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state
        .received
        .lock()
        .unwrap()
        .push(Received { content_type, body });
    let text = if state.status == StatusCode::OK {
        "ok".to_string()
    } else {
        "invalid_payload".to_string()
    };
    (state.status, text)
}

/// An address nothing listens on.
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/hook", addr)
}

/// In-memory transport that answers with a fixed status and counts requests.
pub struct CountingTransport {
    status: u16,
    sent: Mutex<Vec<Value>>,
}

impl CountingTransport {
    pub fn answering(status: u16) -> Self {
        Self {
            status,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookTransport for CountingTransport {
    async fn post_json(&self, body: Vec<u8>) -> Result<DeliveryResult> {
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        self.sent.lock().unwrap().push(value);
        Ok(DeliveryResult {
            status_code: self.status,
            status_text: format!("{}", self.status),
            body: String::new(),
        })
    }
}

/// Transport whose every request fails before reaching the server.
pub struct UnreachableTransport {
    pub attempts: Mutex<usize>,
}

#[async_trait]
impl WebhookTransport for UnreachableTransport {
    async fn post_json(&self, _body: Vec<u8>) -> Result<DeliveryResult> {
        *self.attempts.lock().unwrap() += 1;
        Err(NotifyError::TransportFailed("connection refused".to_string()))
    }
}

pub fn github_headers(event: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("x-github-event".to_string(), event.to_string());
    headers
}

pub fn push_body() -> Value {
    json!({
        "ref": "refs/tags/simple-tag",
        "commits": [{
            "id": "0123456789abcdef0123456789abcdef01234567",
            "url": "U",
            "message": "Small Changes"
        }],
        "repository": {"full_name": "Codertocat/Hello-World", "html_url": "R"},
        "sender": {"login": "Codertocat"}
    })
}
