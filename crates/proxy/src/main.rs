//! Replenish Proxy - Main Entry Point
//!
//! Serves `POST /api/predict` and forwards submissions to the upstream
//! forecasting service.

use replenish_common::{ReplenishConfig, Result};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = ReplenishConfig::load(None)?;

    // Initialize logging
    let level = &config.observability.log_level;
    let structured = config.observability.structured_logging;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("replenish_proxy={level},replenish_common={level},tower_http=info,axum=info").into()
            }),
        )
        .with(structured.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!structured).then(tracing_subscriber::fmt::layer))
        .init();

    info!("Starting Replenish Proxy");
    info!(
        "Proxy configuration loaded: environment={}, bind={}:{}, upstream={}, locale={}",
        config.environment, config.bind_address, config.port, config.proxy.upstream_url, config.locale
    );

    // Missing credentials are fatal in production
    let (credential, source) = config.resolve_credential()?;
    if source.is_insecure() {
        warn!(
            "Using the built-in demo credential; set {} before deploying",
            config.proxy.api_key_env
        );
    } else {
        info!("Upstream credential loaded from {}", source);
    }
    if config.proxy.send_api_key_header {
        info!("Sending credential as both Authorization and x-api-key headers");
    }

    let app = replenish_proxy::build_app(&config, &credential)?;
    drop(credential);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Replenish Proxy listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
            }
        })
        .await?;

    info!("Replenish Proxy shutdown complete");
    Ok(())
}
