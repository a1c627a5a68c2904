//! Decision observation.
//!
//! The engine reports every step through a [`DecisionObserver`] instead of
//! logging directly, so embedding applications and tests can capture
//! decisions. [`TracingObserver`] is the production implementation: it emits
//! `tracing` events and bumps the Prometheus counters in [`crate::metrics`].

use tracing::{debug, info, warn};

use crate::error::GateError;
use crate::metrics;
use crate::policy::{RequestInfo, Verdict};

/// Receives notifications from the access decision engine.
///
/// All methods default to no-ops.
pub trait DecisionObserver: Send + Sync {
    /// A request entered the policy chain.
    fn on_request(&self, _req: &RequestInfo<'_>) {}

    /// The request will be forwarded.
    fn on_allow(&self, _verdict: &Verdict, _req: &RequestInfo<'_>) {}

    /// The request was rejected.
    fn on_deny(&self, _verdict: &Verdict, _req: &RequestInfo<'_>) {}

    /// Permissive mode let the request through; `enforced` is what the
    /// chain would have decided without it.
    fn on_permissive(&self, _enforced: &Verdict, _req: &RequestInfo<'_>) {}

    /// A non-fatal error occurred while evaluating the request.
    fn on_error(&self, _error: &GateError, _req: &RequestInfo<'_>) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DecisionObserver for NoopObserver {}

/// Observer backed by `tracing` and Prometheus counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DecisionObserver for TracingObserver {
    fn on_request(&self, req: &RequestInfo<'_>) {
        debug!(
            uri = %req.request_uri(),
            user_agent = %req.user_agent(),
            "Evaluating request"
        );
    }

    fn on_allow(&self, verdict: &Verdict, req: &RequestInfo<'_>) {
        debug!(rule = %verdict.rule(), uri = %req.request_uri(), "Request allowed");
        metrics::record_decision("allow", verdict.rule().as_str());
    }

    fn on_deny(&self, verdict: &Verdict, req: &RequestInfo<'_>) {
        warn!(
            rule = %verdict.rule(),
            uri = %req.request_uri(),
            user_agent = %req.user_agent(),
            "Request denied"
        );
        metrics::record_decision("deny", verdict.rule().as_str());
    }

    fn on_permissive(&self, enforced: &Verdict, req: &RequestInfo<'_>) {
        if let Verdict::Deny { rule, message, .. } = enforced {
            info!(
                rule = %rule,
                reason = %message,
                uri = %req.request_uri(),
                "Permissive mode: request would have been denied"
            );
            metrics::record_permissive_would_deny(rule.as_str());
        }
    }

    fn on_error(&self, error: &GateError, req: &RequestInfo<'_>) {
        warn!(error = %error, uri = %req.request_uri(), "Error while evaluating request");
        metrics::record_internal_error(error.kind());
    }
}
