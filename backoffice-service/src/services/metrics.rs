//! Prometheus metrics for backoffice-service.
//!
//! HTTP request counters come through the `metrics` facade (fed by the
//! shared middleware) and need a recorder installed; the domain metrics are
//! plain prometheus statics on the default registry. `/metrics` serves both.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "backoffice_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Quote counter by status.
pub static QUOTES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_quotes_total",
        "Total number of quotes by status",
        &["status"] // draft, sent, accepted, declined
    )
    .expect("Failed to register quotes_total")
});

/// Order counter by status.
pub static ORDERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_orders_total",
        "Total number of orders by status",
        &["status"]
    )
    .expect("Failed to register orders_total")
});

/// Counts quote lines whose net price had to be clamped to zero.
pub static PRICE_CLAMPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_price_clamps_total",
        "Quote lines with a net price clamped to zero",
        &["kind"]
    )
    .expect("Failed to register price_clamps_total")
});

/// Outbound email counter.
pub static EMAILS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_emails_total",
        "Outbound communication emails by outcome",
        &["outcome"] // sent, failed, mock
    )
    .expect("Failed to register emails_total")
});

/// Install the `metrics` facade recorder and force the domain statics.
/// Called once from `main`; tests skip it and `/metrics` degrades to the
/// domain metrics alone.
pub fn init_metrics() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder");
    if METRICS_HANDLE.set(handle).is_err() {
        panic!("Metrics already initialized");
    }

    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&QUOTES_TOTAL);
    Lazy::force(&ORDERS_TOTAL);
    Lazy::force(&PRICE_CLAMPS_TOTAL);
    Lazy::force(&EMAILS_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    if let Ok(domain_metrics) = encoder.encode_to_string(&metric_families) {
        output.push_str(&domain_metrics);
    }

    output
}
