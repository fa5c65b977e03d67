// Copyright (c) 2026 memograde developers. Licensed under MIT.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize telemetry (logs + metrics).
pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "memograde=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if PROM_HANDLE.set(handle).is_err() {
        tracing::warn!("telemetry initialized twice; keeping the first recorder");
    }

    metrics::describe_counter!(
        "memograde_authorizations_total",
        "Authorization transactions accepted by the ledger"
    );
    metrics::describe_counter!(
        "memograde_submissions_total",
        "Code-submission transactions accepted by the ledger"
    );
    metrics::describe_counter!("memograde_checks_total", "Successful code checks");
    metrics::describe_counter!(
        "memograde_ledger_unavailable_total",
        "Ledger queries or submissions that failed in transport"
    );
    metrics::describe_counter!(
        "memograde_ledger_rejected_total",
        "Envelopes the ledger validated and refused"
    );

    metrics::gauge!("memograde_up", 1.0);
}

/// Render the current metrics snapshot for the `/metrics` endpoint.
pub fn get_metrics() -> String {
    if let Some(handle) = PROM_HANDLE.get() {
        handle.render()
    } else {
        "# metrics not initialized".to_string()
    }
}
