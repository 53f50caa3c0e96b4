use std::sync::Arc;

use replenish_common::Messages;

use crate::upstream_client::UpstreamClient;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    pub messages: &'static Messages,
    pub metrics_enabled: bool,
}
