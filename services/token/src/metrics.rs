//! Prometheus metrics for the token issuer.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, CounterVec, Encoder, Histogram, TextEncoder,
};

/// Tokens issued, labelled by whether the call created or rotated the key.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_issuer_tokens_issued_total",
        "Total number of tokens issued",
        &["key_changed"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Key store operations.
pub static KEY_OPERATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_issuer_key_operations_total",
        "Total number of signing key operations",
        &["operation", "status"]
    )
    .expect("Failed to register key_operations metric")
});

/// Failed issuance requests by error code.
pub static REQUEST_ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_issuer_request_errors_total",
        "Total number of failed issuance requests",
        &["code"]
    )
    .expect("Failed to register request_errors metric")
});

/// End-to-end issuance latency, key generation included.
pub static ISSUE_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "token_issuer_issue_latency_seconds",
        "Token issuance latency in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register issue_latency metric")
});

/// Record an issued token.
pub fn record_token_issued(key_changed: bool) {
    let label = if key_changed { "true" } else { "false" };
    TOKENS_ISSUED.with_label_values(&[label]).inc();
}

/// Record a key store operation (`load`, `create`, `rotate`).
pub fn record_key_operation(operation: &str, status: &str) {
    KEY_OPERATIONS
        .with_label_values(&[operation, status])
        .inc();
}

/// Record a failed request.
pub fn record_request_error(code: &str) {
    REQUEST_ERRORS.with_label_values(&[code]).inc();
}

/// Record issuance latency.
pub fn record_issue_latency(duration_secs: f64) {
    ISSUE_LATENCY.observe(duration_secs);
}

/// Render every registered metric in the Prometheus text format.
#[must_use]
pub fn render() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_token_issued() {
        record_token_issued(true);
        let value = TOKENS_ISSUED.with_label_values(&["true"]).get();
        assert!(value > 0.0);
    }

    #[test]
    fn test_record_request_error() {
        record_request_error("VALIDATION");
        let value = REQUEST_ERRORS.with_label_values(&["VALIDATION"]).get();
        assert!(value > 0.0);
    }

    #[test]
    fn test_render_includes_registered_metrics() {
        record_key_operation("rotate", "success");
        record_issue_latency(0.05);

        let text = render();
        assert!(text.contains("token_issuer_key_operations_total"));
        assert!(text.contains("token_issuer_issue_latency_seconds"));
    }
}
