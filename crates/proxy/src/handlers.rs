//! HTTP handlers for the prediction proxy

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Json, Response},
};
use replenish_common::{Messages, ReplenishError, Result, METRICS};
use replenish_proto::{
    ErrorBody, HealthResponse, MalformedUpstreamBody, PredictionPayload, UpstreamRejectedBody,
};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::normalize::normalize;
use crate::state::AppState;

/// A failed prediction, rendered in the caller's locale
#[derive(Debug)]
pub struct ProxyError {
    pub error: ReplenishError,
    pub messages: &'static Messages,
}

impl ProxyError {
    pub fn new(error: ReplenishError, messages: &'static Messages) -> Self {
        Self { error, messages }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let messages = self.messages;

        match self.error {
            ReplenishError::UpstreamMalformed { raw } => (
                status,
                Json(MalformedUpstreamBody {
                    error: messages.invalid_response.to_string(),
                    raw,
                }),
            )
                .into_response(),
            ReplenishError::UpstreamRejected {
                status: upstream_status,
                status_text,
                details,
                raw,
            } => (
                status,
                Json(UpstreamRejectedBody {
                    error: messages.fetch_failed.to_string(),
                    status: upstream_status,
                    status_text,
                    details,
                    raw,
                }),
            )
                .into_response(),
            ReplenishError::UpstreamTimeout(_) => (
                status,
                Json(ErrorBody {
                    error: messages.upstream_timeout.to_string(),
                }),
            )
                .into_response(),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: messages.proxy_failure.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

/// POST /api/predict - forward a submission to the forecasting service
pub async fn post_predict(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<Json<PredictionPayload>, ProxyError> {
    let metrics = &METRICS.proxy;
    metrics.requests_total.inc();
    let in_flight = metrics.track_in_flight();
    let timer = metrics.request_duration.start_timer();

    let outcome = predict(&state, body).await;

    timer.observe_duration();
    drop(in_flight);

    match outcome {
        Ok(prediction) => {
            metrics.requests_success.inc();
            Ok(Json(prediction))
        }
        Err(e) => {
            metrics.requests_failed.with_label_values(&[e.kind()]).inc();
            log_failure(&e);
            Err(ProxyError::new(e, state.messages))
        }
    }
}

async fn predict(
    state: &AppState,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<PredictionPayload> {
    let body = body.map_err(|e| ReplenishError::invalid_input(format!("unreadable request body: {}", e)))?;

    // Forwarded as-is; field checks belong to the form
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ReplenishError::invalid_input(format!("request body is not JSON: {}", e)))?;

    let reply = state.upstream.forward(&payload).await?;
    let prediction = normalize(reply)?;

    info!(
        item_name = ?prediction.item_name,
        recommended_order_quantity = ?prediction.recommended_order_quantity,
        generated_at = ?prediction.generated_at,
        model_version = ?prediction.model_version,
        "Prediction normalized"
    );

    Ok(prediction)
}

fn log_failure(err: &ReplenishError) {
    match err {
        ReplenishError::UpstreamRejected {
            status,
            status_text,
            details,
            raw,
        } => error!(
            status,
            status_text = %status_text,
            details = %details,
            raw = %raw,
            "Upstream predict error"
        ),
        ReplenishError::UpstreamMalformed { raw } => {
            warn!(raw = %raw, "Upstream returned a non-JSON body")
        }
        other => error!(kind = other.kind(), error = %other, "Predict route error"),
    }
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics(State(state): State<AppState>) -> Response {
    if !state.metrics_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        METRICS.gather(),
    )
        .into_response()
}
