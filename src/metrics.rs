//! Prometheus metrics for the access gate.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `gate_decisions_total` - Verdicts (labels: verdict, rule)
//! - `gate_permissive_would_deny_total` - Requests permissive mode let through
//!   that enforcement would have denied (label: rule)
//! - `gate_internal_errors_total` - Address parse and serialization failures
//!   (label: kind)
//!
//! # Usage
//!
//! ```rust,ignore
//! use api_token_gate::metrics::{init_metrics, record_decision};
//!
//! init_metrics("0.0.0.0:9090".parse()?)?;
//! record_decision("allow", "header_token");
//! ```

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const DECISIONS_TOTAL: &str = "gate_decisions_total";
    pub const PERMISSIVE_WOULD_DENY_TOTAL: &str = "gate_permissive_would_deny_total";
    pub const INTERNAL_ERRORS_TOTAL: &str = "gate_internal_errors_total";
}

/// Initialize the Prometheus metrics exporter.
///
/// Starts the Prometheus HTTP listener on `metrics_addr` and registers the
/// metric descriptions.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::DECISIONS_TOTAL,
        "Total number of access decisions by verdict and deciding rule"
    );
    describe_counter!(
        names::PERMISSIVE_WOULD_DENY_TOTAL,
        "Requests allowed by permissive mode that would otherwise be denied"
    );
    describe_counter!(
        names::INTERNAL_ERRORS_TOTAL,
        "Non-fatal errors raised while evaluating requests"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record a final verdict.
pub fn record_decision(verdict: &'static str, rule: &'static str) {
    counter!(names::DECISIONS_TOTAL, "verdict" => verdict, "rule" => rule).increment(1);
}

/// Record a request that permissive mode let through despite a would-be denial.
pub fn record_permissive_would_deny(rule: &'static str) {
    counter!(names::PERMISSIVE_WOULD_DENY_TOTAL, "rule" => rule).increment(1);
}

/// Record a non-fatal evaluation error.
pub fn record_internal_error(kind: &'static str) {
    counter!(names::INTERNAL_ERRORS_TOTAL, "kind" => kind).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These only verify the recorders don't panic without an installed exporter.

    #[test]
    fn test_record_decision() {
        record_decision("allow", "header_token");
        record_decision("deny", "default_deny");
    }

    #[test]
    fn test_record_permissive_would_deny() {
        record_permissive_would_deny("user_agent_deny");
    }

    #[test]
    fn test_record_internal_error() {
        record_internal_error("address_parse");
    }
}
