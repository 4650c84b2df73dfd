//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!(
        "shroud_requests_total",
        "Chat requests by final status and provider"
    );
    metrics::describe_histogram!(
        "shroud_request_duration_seconds",
        "End-to-end latency of forwarded requests"
    );
    metrics::describe_counter!("shroud_redactions_total", "Secrets replaced, by label");
    metrics::describe_counter!(
        "shroud_rehydration_misses_total",
        "Placeholders left unresolved in responses"
    );
    metrics::describe_counter!(
        "shroud_translation_failures_total",
        "Provider responses returned raw because translation failed"
    );
    metrics::describe_counter!(
        "shroud_background_jobs_total",
        "Audit and usage writes by job and result"
    );
    metrics::describe_counter!(
        "shroud_background_dropped_total",
        "Audit and usage jobs dropped on a full queue"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        // This should not panic
        init_metrics();
        init_metrics();
    }
}
