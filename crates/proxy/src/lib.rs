//! Replenish prediction proxy
//!
//! Stateless same-origin proxy between the inventory form and the upstream
//! forecasting service.

pub mod handlers;
pub mod normalize;
pub mod routes;
pub mod state;
pub mod upstream_client;

use std::sync::Arc;

use axum::Router;
use replenish_common::{Messages, ReplenishConfig, Result, SecretString};

pub use handlers::ProxyError;
pub use normalize::normalize;
pub use routes::create_router;
pub use state::AppState;
pub use upstream_client::{UpstreamClient, UpstreamReply};

/// Assemble the application from configuration and a resolved credential
pub fn build_app(config: &ReplenishConfig, credential: &SecretString) -> Result<Router> {
    let upstream = UpstreamClient::new(&config.proxy, credential)?;

    let state = AppState {
        upstream: Arc::new(upstream),
        messages: Messages::for_locale(config.locale),
        metrics_enabled: config.observability.enable_metrics,
    };

    Ok(create_router(state, config.proxy.body_limit_bytes))
}
