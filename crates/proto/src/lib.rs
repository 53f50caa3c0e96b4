//! Replenish wire contract
//!
//! JSON shapes exchanged between the client, the prediction proxy and the
//! upstream forecasting service.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Upper bound accepted for `current_balance`
pub const MAX_CURRENT_BALANCE: f64 = 100_000.0;

// Inbound request

/// One validated user submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryInput {
    pub item_name: String,
    pub current_balance: f64,
    pub consumption: f64,
    pub cogs: f64,
}

// Successful prediction

/// Body returned by the proxy on success.
///
/// Every field is copied untouched from the upstream body. Fields the upstream
/// did not send are left out of the serialized JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_order_quantity: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<Value>,
}

impl PredictionPayload {
    /// Pick the four public fields out of an arbitrary upstream body.
    ///
    /// Anything else the upstream sends is dropped. A body that is not a JSON
    /// object yields an empty payload.
    pub fn from_upstream(body: &Value) -> Self {
        let field = |name: &str| body.get(name).cloned();
        Self {
            item_name: field("item_name"),
            recommended_order_quantity: field("recommended_order_quantity"),
            generated_at: field("generated_at"),
            model_version: field("model_version"),
        }
    }
}

/// Prediction accepted by the caller after checking the required fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub item_name: String,

    /// Zero is a valid forecast: reorder nothing.
    pub recommended_order_quantity: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

/// A success payload lacking a field the display needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncompletePrediction {
    pub field: &'static str,
}

impl fmt::Display for IncompletePrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prediction is missing `{}`", self.field)
    }
}

impl std::error::Error for IncompletePrediction {}

impl TryFrom<PredictionPayload> for PredictionResult {
    type Error = IncompletePrediction;

    fn try_from(payload: PredictionPayload) -> Result<Self, Self::Error> {
        let item_name = payload
            .item_name
            .as_ref()
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or(IncompletePrediction { field: "item_name" })?
            .to_string();

        // Presence is what matters here, not truthiness.
        let recommended_order_quantity = payload
            .recommended_order_quantity
            .as_ref()
            .and_then(Value::as_f64)
            .ok_or(IncompletePrediction {
                field: "recommended_order_quantity",
            })?;

        let text = |value: Option<Value>| match value {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };

        Ok(Self {
            item_name,
            recommended_order_quantity,
            generated_at: text(payload.generated_at),
            model_version: text(payload.model_version),
        })
    }
}

// Error envelopes emitted by the proxy

/// Local failure (500) or upstream timeout (504)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Upstream answered with something that is not JSON (502)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MalformedUpstreamBody {
    pub error: String,
    pub raw: String,
}

/// Upstream answered with a non-success status; sent with that same status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamRejectedBody {
    pub error: String,
    pub status: u16,
    #[serde(rename = "statusText")]
    pub status_text: String,
    pub details: Value,
    pub raw: String,
}

/// Health probe response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// Caller-side failure

/// The single readable message shown to the user when a prediction fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorReport {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_keeps_only_public_fields() {
        let upstream = json!({
            "item_name": "Widget",
            "recommended_order_quantity": 42,
            "generated_at": "2024-01-01T00:00:00Z",
            "model_version": "v1",
            "internal_score": 0.93,
            "features": [1, 2, 3]
        });

        let payload = PredictionPayload::from_upstream(&upstream);
        let body = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            body,
            json!({
                "item_name": "Widget",
                "recommended_order_quantity": 42,
                "generated_at": "2024-01-01T00:00:00Z",
                "model_version": "v1"
            })
        );
    }

    #[test]
    fn test_payload_omits_absent_fields() {
        let payload = PredictionPayload::from_upstream(&json!({ "item_name": "Bolt" }));
        let body = serde_json::to_value(&payload).unwrap();

        assert_eq!(body, json!({ "item_name": "Bolt" }));
    }

    #[test]
    fn test_payload_from_non_object_is_empty() {
        let payload = PredictionPayload::from_upstream(&json!([1, 2, 3]));
        assert_eq!(payload, PredictionPayload::default());
    }

    #[test]
    fn test_zero_quantity_is_a_valid_result() {
        let payload = PredictionPayload::from_upstream(&json!({
            "item_name": "Gasket",
            "recommended_order_quantity": 0
        }));

        let result = PredictionResult::try_from(payload).unwrap();
        assert_eq!(result.recommended_order_quantity, 0.0);
        assert_eq!(result.generated_at, None);
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let no_quantity = PredictionPayload::from_upstream(&json!({ "item_name": "Gasket" }));
        assert_eq!(
            PredictionResult::try_from(no_quantity).unwrap_err().field,
            "recommended_order_quantity"
        );

        let empty_name = PredictionPayload::from_upstream(&json!({
            "item_name": "",
            "recommended_order_quantity": 3
        }));
        assert_eq!(PredictionResult::try_from(empty_name).unwrap_err().field, "item_name");
    }

    #[test]
    fn test_rejected_body_uses_status_text_key() {
        let body = UpstreamRejectedBody {
            error: "failed".to_string(),
            status: 503,
            status_text: "Service Unavailable".to_string(),
            details: json!({ "detail": "overloaded" }),
            raw: "{\"detail\":\"overloaded\"}".to_string(),
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["statusText"], "Service Unavailable");
        assert_eq!(value["details"]["detail"], "overloaded");
    }
}
