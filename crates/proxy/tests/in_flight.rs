//! In-flight accounting when a caller goes away mid-request.
//!
//! Kept in its own test binary so no other test touches the global gauge.

mod mocks;

use axum::http::StatusCode;
use mocks::{post_predict, proxy_app, MockUpstream};
use replenish_common::{Locale, METRICS};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_cancelled_request_releases_active_slot() {
    let upstream = MockUpstream::spawn_with_delay(
        StatusCode::OK,
        r#"{"item_name":"Widget","recommended_order_quantity":1}"#,
        Some(Duration::from_secs(5)),
    )
    .await;
    let app = proxy_app(&upstream.url, 30_000, Locale::En);

    let before = METRICS.proxy.active_requests.get();

    let submission = json!({
        "item_name": "Widget",
        "current_balance": 1250,
        "consumption": 300,
        "cogs": 75
    })
    .to_string();
    let outcome = tokio::time::timeout(Duration::from_millis(200), post_predict(app, submission)).await;
    assert!(outcome.is_err(), "request should still be waiting on the upstream");

    // The upstream saw the call, so the handler was in flight when dropped
    assert_eq!(upstream.requests().len(), 1);
    assert_eq!(METRICS.proxy.active_requests.get(), before);
}
