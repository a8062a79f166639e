use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics exporter
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();

    let handle = builder
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    init_metric_descriptions();

    handle
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "carecompare_requests_total",
        "Total number of API requests"
    );
    describe_counter!(
        "carecompare_searches_total",
        "Total number of price comparison searches"
    );
    describe_histogram!(
        "carecompare_request_duration_seconds",
        "Request duration in seconds"
    );
    describe_counter!(
        "carecompare_errors_total",
        "Total number of errors"
    );
    describe_gauge!(
        "carecompare_active_sessions",
        "Number of live search sessions"
    );
    describe_gauge!(
        "carecompare_info",
        "Service version and build information"
    );

    gauge!("carecompare_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record a request
pub fn record_request(endpoint: &str) {
    counter!(
        "carecompare_requests_total",
        "endpoint" => endpoint.to_string(),
    )
    .increment(1);
}

/// Record a comparison search and its outcome (results/empty/failed)
pub fn record_search(test: &str, outcome: &str) {
    counter!(
        "carecompare_searches_total",
        "test" => test.to_string(),
        "outcome" => outcome.to_string(),
    )
    .increment(1);
}

/// Record request duration
pub fn record_duration(endpoint: &str, duration: Duration) {
    histogram!(
        "carecompare_request_duration_seconds",
        "endpoint" => endpoint.to_string(),
    )
    .record(duration.as_secs_f64());
}

/// Update the live session gauge after a cleanup sweep
pub fn update_session_count(count: usize) {
    gauge!("carecompare_active_sessions").set(count as f64);
}

/// Record an error
pub fn record_error(endpoint: &str, error_type: &str) {
    counter!(
        "carecompare_errors_total",
        "endpoint" => endpoint.to_string(),
        "error_type" => error_type.to_string(),
    )
    .increment(1);
}
