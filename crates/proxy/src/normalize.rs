//! Upstream response normalization
//!
//! Reduces whatever the forecasting service answers to the small set of
//! shapes the client understands.

use crate::upstream_client::UpstreamReply;
use replenish_common::error::{ReplenishError, Result};
use replenish_proto::PredictionPayload;
use serde_json::Value;

/// Turn an upstream reply into a prediction or a classified error.
///
/// The body is parsed before the status is looked at, so a non-JSON error page
/// is reported as malformed rather than rejected.
pub fn normalize(reply: UpstreamReply) -> Result<PredictionPayload> {
    let parsed: Value = match serde_json::from_str(&reply.body) {
        Ok(value) => value,
        Err(_) => return Err(ReplenishError::UpstreamMalformed { raw: reply.body }),
    };

    if !reply.status.is_success() {
        return Err(ReplenishError::UpstreamRejected {
            status: reply.status.as_u16(),
            status_text: reply.status_text,
            details: parsed,
            raw: reply.body,
        });
    }

    Ok(PredictionPayload::from_upstream(&parsed))
}
