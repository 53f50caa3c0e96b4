//! Client for the proxy's prediction endpoint

use crate::reconcile::failure_message;
use replenish_common::config::ClientConfig;
use replenish_common::{Messages, ReplenishError, Result};
use replenish_proto::{ErrorReport, InventoryInput, PredictionPayload, PredictionResult};
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How much of a failure body is kept in diagnostic logs
pub const DIAGNOSTIC_BODY_LIMIT: usize = 500;

/// Calls `POST /api/predict` and turns every outcome into either a validated
/// prediction or a display-ready message
#[derive(Clone)]
pub struct PredictClient {
    http: Client,
    endpoint: Url,
    messages: &'static Messages,
}

impl PredictClient {
    pub fn new(config: &ClientConfig, messages: &'static Messages) -> Result<Self> {
        let endpoint = Url::parse(&config.proxy_url).map_err(|e| {
            ReplenishError::config(format!("Invalid proxy URL {}: {}", config.proxy_url, e))
        })?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| ReplenishError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            messages,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Request a prediction. Never fails with anything but a readable message.
    pub async fn predict(&self, input: &InventoryInput) -> std::result::Result<PredictionResult, ErrorReport> {
        self.exchange(input).await.map_err(|e| self.report(e))
    }

    async fn exchange(&self, input: &InventoryInput) -> Result<PredictionResult> {
        info!(url = %self.endpoint, item_name = %input.item_name, "Sending prediction request");
        debug!(?input, "Prediction request body");

        let response = self.http.post(self.endpoint.clone()).json(input).send().await?;
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        let text = response.text().await?;

        info!(status = status.as_u16(), status_text = %status_text, "Prediction response received");

        if !status.is_success() {
            return Err(ReplenishError::UpstreamRejected {
                status: status.as_u16(),
                status_text,
                details: serde_json::from_str(&text).unwrap_or(Value::Null),
                raw: text,
            });
        }

        // Fields are looked up by name; arrays and scalars carry none
        let body: Value = serde_json::from_str(&text)?;
        if body.is_null() {
            return Err(ReplenishError::UpstreamMalformed { raw: text });
        }
        let payload = PredictionPayload::from_upstream(&body);
        debug!(?payload, "Prediction response body");

        PredictionResult::try_from(payload).map_err(|e| ReplenishError::incomplete(e.to_string()))
    }

    fn report(&self, err: ReplenishError) -> ErrorReport {
        let messages = self.messages;

        match err {
            ReplenishError::UpstreamRejected {
                status,
                status_text,
                details,
                raw,
            } => {
                let message = failure_message(status, &status_text, &raw, messages);
                error!(
                    status,
                    status_text = %status_text,
                    response_text = %truncate(&raw, DIAGNOSTIC_BODY_LIMIT),
                    parsed = %details,
                    message = %message,
                    "API error response"
                );
                ErrorReport::new(message)
            }
            ReplenishError::ResponseIncomplete(reason) => {
                error!(reason = %reason, "Missing required fields in response");
                ErrorReport::new(messages.response_incomplete)
            }
            other => {
                warn!(kind = other.kind(), error = %other, "Prediction request failed");
                ErrorReport::new(messages.connection_failed)
            }
        }
    }
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
