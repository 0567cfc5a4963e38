//! Prometheus metrics helpers for lagwatch.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lagwatch_core::metrics::{init_metrics, start_metrics_server};
//!
//! let handle = init_metrics();
//! start_metrics_server(9095, handle).await?;
//! ```
//!
//! # Metric Naming Conventions
//!
//! - Prefix: Component name (`buffer_`, `correlate_`)
//! - Suffix: Unit or type (`_total`, `_seconds`)

use axum::{Router, routing::get};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if called more than once (the recorder can only be installed once).
pub fn init_metrics() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    register_metrics();

    handle
}

/// Like [`init_metrics`] but returns `None` if a recorder is already installed.
pub fn try_init_metrics() -> Option<PrometheusHandle> {
    PrometheusBuilder::new().install_recorder().ok()
}

/// Start the Prometheus metrics HTTP server on `0.0.0.0:<port>/metrics`.
///
/// Binds before returning so a taken port is reported to the caller, then
/// serves from a background task.
pub async fn start_metrics_server(
    port: u16,
    handle: PrometheusHandle,
) -> Result<(), std::io::Error> {
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Metrics server listening on http://{}/metrics", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Metrics server stopped: {}", e);
        }
    });

    Ok(())
}

/// Register descriptions for every lagwatch metric.
fn register_metrics() {
    // =========================================================================
    // Write-back buffer
    // =========================================================================

    describe_counter!(
        "buffer_items_appended_total",
        "Items appended to the write-back buffer"
    );
    describe_counter!(
        "buffer_items_written_total",
        "Buffered items persisted to the event store"
    );
    describe_counter!(
        "buffer_items_failed_total",
        "Buffered items dropped after a failed write (label: reason)"
    );
    describe_counter!("buffer_flushes_total", "Number of buffer flushes");
    describe_gauge!("buffer_pending_items", "Items waiting in the buffer");
    describe_gauge!(
        "ingest_running",
        "Whether the ingestion daemon is running (1=yes, 0=no)"
    );

    // =========================================================================
    // Correlation
    // =========================================================================

    describe_counter!(
        "correlate_entries_scanned_total",
        "Store entries scanned (label: stream)"
    );
    describe_counter!(
        "correlate_entries_skipped_total",
        "Store entries skipped as undecodable (label: stream)"
    );
    describe_gauge!(
        "correlate_records_matched",
        "Origin events with a confirmation in the last analysis"
    );
    describe_gauge!(
        "correlate_records_unmatched",
        "Origin events without a confirmation in the last analysis"
    );
    describe_gauge!(
        "correlate_mean_latency_seconds",
        "Mean propagation latency over matched records in the last analysis"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_init_metrics_idempotent() {
        let handle1 = try_init_metrics();
        let handle2 = try_init_metrics();

        // At most one should succeed
        assert!(handle1.is_none() || handle2.is_none());
    }

    #[test]
    fn test_register_metrics_does_not_panic() {
        let _ = try_init_metrics();
        register_metrics();
        register_metrics();
    }
}
