//! Metrics collection for Replenish
//!
//! This module provides Prometheus metrics for the prediction proxy.

use lazy_static::lazy_static;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;

/// Metrics registry for Replenish
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    pub registry: Arc<Registry>,
    pub proxy: ProxyMetrics,
}

/// Prediction proxy metrics
#[derive(Debug, Clone)]
pub struct ProxyMetrics {
    /// Total number of prediction requests
    pub requests_total: IntCounter,

    /// Requests answered with a normalized prediction
    pub requests_success: IntCounter,

    /// Failed requests, labelled by error kind
    pub requests_failed: IntCounterVec,

    /// End-to-end request duration
    pub request_duration: Histogram,

    /// Time spent waiting on the upstream service
    pub upstream_response_time: Histogram,

    /// Current in-flight requests
    pub active_requests: IntGauge,
}

/// Holds one slot in `active_requests` until dropped.
///
/// Dropping happens on every exit path, including a cancelled request future.
#[derive(Debug)]
pub struct InFlightGuard {
    gauge: IntGauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

impl ProxyMetrics {
    /// Count a request as in flight for the lifetime of the returned guard
    pub fn track_in_flight(&self) -> InFlightGuard {
        self.active_requests.inc();
        InFlightGuard {
            gauge: self.active_requests.clone(),
        }
    }
}

lazy_static! {
    /// Global metrics registry instance
    pub static ref METRICS: MetricsRegistry = MetricsRegistry::new();
}

impl MetricsRegistry {
    /// Create a new metrics registry
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());

        // Metric names are static, so construction and registration cannot fail
        let requests_total = IntCounter::new(
            "proxy_requests_total",
            "Total number of prediction requests"
        ).expect("valid metric");

        let requests_success = IntCounter::new(
            "proxy_requests_success_total",
            "Total number of successful prediction requests"
        ).expect("valid metric");

        let requests_failed = IntCounterVec::new(
            Opts::new(
                "proxy_requests_failed_total",
                "Total number of failed prediction requests"
            ),
            &["kind"],
        ).expect("valid metric");

        let request_duration = Histogram::with_opts(
            HistogramOpts::new(
                "proxy_request_duration_seconds",
                "Prediction request duration in seconds"
            ).buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0])
        ).expect("valid metric");

        let upstream_response_time = Histogram::with_opts(
            HistogramOpts::new(
                "proxy_upstream_response_time_seconds",
                "Upstream forecasting service response time in seconds"
            ).buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0])
        ).expect("valid metric");

        let active_requests = IntGauge::new(
            "proxy_active_requests",
            "Current number of in-flight prediction requests"
        ).expect("valid metric");

        // Register all metrics
        registry.register(Box::new(requests_total.clone())).expect("unique metric");
        registry.register(Box::new(requests_success.clone())).expect("unique metric");
        registry.register(Box::new(requests_failed.clone())).expect("unique metric");
        registry.register(Box::new(request_duration.clone())).expect("unique metric");
        registry.register(Box::new(upstream_response_time.clone())).expect("unique metric");
        registry.register(Box::new(active_requests.clone())).expect("unique metric");

        let proxy = ProxyMetrics {
            requests_total,
            requests_success,
            requests_failed,
            request_duration,
            upstream_response_time,
            active_requests,
        };

        MetricsRegistry { registry, proxy }
    }

    /// Gather all metrics as text
    pub fn gather(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            return format!("# failed to encode metrics: {}\n", e);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registry() {
        let metrics = MetricsRegistry::new();

        // Record some metrics
        metrics.proxy.requests_total.inc();
        metrics.proxy.active_requests.inc();
        metrics
            .proxy
            .requests_failed
            .with_label_values(&["upstream_timeout"])
            .inc();

        // Gather metrics
        let output = metrics.gather();
        assert!(output.contains("proxy_requests_total"));
        assert!(output.contains("proxy_active_requests"));
        assert!(output.contains("kind=\"upstream_timeout\""));
    }

    #[test]
    fn test_in_flight_guard_releases_on_drop() {
        let metrics = MetricsRegistry::new();

        let first = metrics.proxy.track_in_flight();
        let second = metrics.proxy.track_in_flight();
        assert_eq!(metrics.proxy.active_requests.get(), 2);

        drop(first);
        assert_eq!(metrics.proxy.active_requests.get(), 1);
        drop(second);
        assert_eq!(metrics.proxy.active_requests.get(), 0);
    }

    #[tokio::test]
    async fn test_in_flight_guard_released_when_future_is_cancelled() {
        let metrics = MetricsRegistry::new();
        let proxy = metrics.proxy.clone();

        let pending = async move {
            let _in_flight = proxy.track_in_flight();
            std::future::pending::<()>().await;
        };

        let outcome = tokio::time::timeout(std::time::Duration::from_millis(20), pending).await;
        assert!(outcome.is_err());
        assert_eq!(metrics.proxy.active_requests.get(), 0);
    }
}
