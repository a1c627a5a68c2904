//! The access decision engine.
//!
//! Runs the [`Rule`] chain against a request and turns the first decisive
//! outcome into a [`Verdict`]. The engine is immutable after construction
//! and shared behind an `Arc` by every request.

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, HeaderName};
use axum::http::{HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use chrono::Utc;

use super::compiled::Policy;
use super::request::RequestInfo;
use super::response::{DenialResponse, JSON_CONTENT_TYPE, format_timestamp};
use super::rules::{Outcome, Rule};
use crate::config::GateConfig;
use crate::error::GateResult;
use crate::observer::{DecisionObserver, TracingObserver};

/// Final decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Forward the request downstream with `strip` removed.
    Allow {
        rule: Rule,
        strip: Vec<HeaderName>,
    },
    /// Answer with a JSON denial.
    Deny {
        rule: Rule,
        message: String,
        status: StatusCode,
    },
}

impl Verdict {
    /// The rule that decided.
    pub fn rule(&self) -> Rule {
        match self {
            Verdict::Allow { rule, .. } | Verdict::Deny { rule, .. } => *rule,
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow { .. })
    }
}

/// Decides, per request, whether to forward or deny.
#[derive(Clone)]
pub struct AccessDecisionEngine {
    policy: Arc<Policy>,
    observer: Arc<dyn DecisionObserver>,
}

impl AccessDecisionEngine {
    /// Validate `config` and build an engine reporting through [`TracingObserver`].
    ///
    /// # Errors
    ///
    /// Any configuration error from [`Policy::compile`].
    pub fn new(config: &GateConfig) -> GateResult<Self> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    /// Build an engine reporting through a custom observer.
    pub fn with_observer(
        config: &GateConfig,
        observer: Arc<dyn DecisionObserver>,
    ) -> GateResult<Self> {
        Ok(Self {
            policy: Arc::new(Policy::compile(config)?),
            observer,
        })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Evaluate the full chain.
    ///
    /// Evaluation never fails: rule errors are reported to the observer and
    /// the rule is skipped. In permissive mode the enforced chain is also
    /// run so the observer learns what would have happened.
    pub fn evaluate(&self, req: &RequestInfo<'_>) -> Verdict {
        self.observer.on_request(req);

        let verdict = self.run_chain(&Rule::CHAIN, req);

        if verdict.rule() == Rule::Permissive {
            let enforced = self.run_chain(&Rule::ENFORCED, req);
            self.observer.on_permissive(&enforced, req);
        }

        if verdict.is_allow() {
            self.observer.on_allow(&verdict, req);
        } else {
            self.observer.on_deny(&verdict, req);
        }

        verdict
    }

    /// Run the decisive steps in order; the first decision wins and a
    /// request none of them decides falls to [`Rule::DefaultDeny`].
    fn run_chain(&self, rules: &[Rule], req: &RequestInfo<'_>) -> Verdict {
        for &rule in rules {
            match rule.check(&self.policy, req) {
                Ok(Outcome::Allow { strip }) => return Verdict::Allow { rule, strip },
                Ok(Outcome::Deny { message }) => {
                    return Verdict::Deny {
                        rule,
                        message,
                        status: StatusCode::FORBIDDEN,
                    };
                }
                Ok(Outcome::NotApplicable) => {}
                Err(e) => self.observer.on_error(&e, req),
            }
        }

        Verdict::Deny {
            rule: Rule::DefaultDeny,
            message: self.policy.default_deny_message(),
            status: StatusCode::FORBIDDEN,
        }
    }

    /// Build the JSON denial for `req`.
    ///
    /// A body that fails to serialize is reported and replaced with an empty
    /// one; the status code is still sent.
    pub fn denial_response(
        &self,
        message: &str,
        status: StatusCode,
        req: &RequestInfo<'_>,
    ) -> Response<Body> {
        let timestamp = format_timestamp(Utc::now(), self.policy.use_unix_timestamp());
        let body = match DenialResponse::new(message, status, timestamp, req).to_json() {
            Ok(body) => body,
            Err(e) => {
                self.observer.on_error(&e, req);
                Vec::new()
            }
        };

        (
            status,
            [(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
            body,
        )
            .into_response()
    }
}

impl fmt::Debug for AccessDecisionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessDecisionEngine")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
