//! Mock upstream forecasting service and proxy fixtures

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use replenish_common::{Locale, ReplenishConfig, SecretString};
use serde_json::Value;
use tokio::task::JoinHandle;
use tower::ServiceExt;

pub const TEST_API_KEY: &str = "test-upstream-key";

/// A request the mock upstream received
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: &'static str,
    delay: Option<Duration>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

/// Upstream stand-in listening on an ephemeral port
pub struct MockUpstream {
    pub url: String,
    pub seen: Arc<Mutex<Vec<SeenRequest>>>,
    handle: JoinHandle<()>,
}

impl MockUpstream {
    /// Answer every prediction with a fixed status and body
    pub async fn spawn(status: StatusCode, body: &'static str) -> Self {
        Self::spawn_with_delay(status, body, None).await
    }

    /// Same as `spawn`, but wait before answering
    pub async fn spawn_with_delay(status: StatusCode, body: &'static str, delay: Option<Duration>) -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status,
            body,
            delay,
            seen: seen.clone(),
        };
        let app = Router::new().route("/predict", post(respond)).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test port");
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            url: format!("http://{}/predict", addr),
            seen,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn respond(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    state.seen.lock().unwrap().push(SeenRequest { headers, body });

    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    (state.status, state.body).into_response()
}

/// URL of a local port nothing listens on
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test port");
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/predict", addr)
}

/// Proxy configuration pointed at `upstream_url`
pub fn proxy_config(upstream_url: &str, timeout_ms: u64, locale: Locale) -> ReplenishConfig {
    let mut config = ReplenishConfig::default();
    config.locale = locale;
    config.proxy.upstream_url = upstream_url.to_string();
    config.proxy.upstream_timeout_ms = timeout_ms;
    config
}

/// Proxy application built from `config`
pub fn proxy_app_from(config: &ReplenishConfig) -> Router {
    replenish_proxy::build_app(config, &SecretString::new(TEST_API_KEY)).expect("build proxy app")
}

/// Proxy application pointed at `upstream_url`
pub fn proxy_app(upstream_url: &str, timeout_ms: u64, locale: Locale) -> Router {
    proxy_app_from(&proxy_config(upstream_url, timeout_ms, locale))
}

/// POST a raw body to `/api/predict` and decode the JSON answer
pub async fn post_predict(app: Router, body: impl Into<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/predict")
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, headers, value)
}
