//! The ordered policy chain.
//!
//! Each [`Rule`] is a pure function of the compiled [`Policy`] and the
//! request. Rules never touch the request; header stripping is returned as
//! data in [`Outcome::Allow`] and applied by the middleware.
//!
//! ```text
//! Permissive → UserAgentAllow → HeaderToken → BearerToken
//!            → IpAllowlist → UserAgentDeny → DefaultDeny
//! ```

use std::fmt;

use axum::http::header::HeaderName;

use super::compiled::Policy;
use super::request::RequestInfo;
use crate::error::GateResult;
use crate::middleware::ip::extract_candidate_ips;

/// Result of a single rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Forward the request after removing these headers.
    Allow { strip: Vec<HeaderName> },
    /// Reject with this message.
    Deny { message: String },
    /// Fall through to the next rule.
    NotApplicable,
}

/// A named step of the policy chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Permissive,
    UserAgentAllow,
    HeaderToken,
    BearerToken,
    IpAllowlist,
    UserAgentDeny,
    DefaultDeny,
}

impl Rule {
    /// Decisive steps in evaluation order. A request none of them decides
    /// is denied by [`Rule::DefaultDeny`].
    pub const CHAIN: [Rule; 6] = [
        Rule::Permissive,
        Rule::UserAgentAllow,
        Rule::HeaderToken,
        Rule::BearerToken,
        Rule::IpAllowlist,
        Rule::UserAgentDeny,
    ];

    /// The chain without the permissive bypass, i.e. what would be enforced.
    pub const ENFORCED: [Rule; 5] = [
        Rule::UserAgentAllow,
        Rule::HeaderToken,
        Rule::BearerToken,
        Rule::IpAllowlist,
        Rule::UserAgentDeny,
    ];

    /// Stable snake_case name for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Permissive => "permissive",
            Rule::UserAgentAllow => "user_agent_allow",
            Rule::HeaderToken => "header_token",
            Rule::BearerToken => "bearer_token",
            Rule::IpAllowlist => "ip_allowlist",
            Rule::UserAgentDeny => "user_agent_deny",
            Rule::DefaultDeny => "default_deny",
        }
    }

    /// Evaluate this rule.
    ///
    /// # Errors
    ///
    /// Only [`Rule::IpAllowlist`] fails, with `GateError::AddressParse`, when
    /// a forwarding header holds something that is not an address. Callers
    /// treat that as [`Outcome::NotApplicable`].
    pub fn check(self, policy: &Policy, req: &RequestInfo<'_>) -> GateResult<Outcome> {
        let outcome = match self {
            Rule::Permissive => permissive(policy),
            Rule::UserAgentAllow => user_agent_allow(policy, req),
            Rule::HeaderToken => header_token(policy, req),
            Rule::BearerToken => bearer_token(policy, req),
            Rule::IpAllowlist => return ip_allowlist(policy, req),
            Rule::UserAgentDeny => user_agent_deny(policy, req),
            Rule::DefaultDeny => Outcome::Deny {
                message: policy.default_deny_message(),
            },
        };

        Ok(outcome)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn permissive(policy: &Policy) -> Outcome {
    if !policy.permissive_mode {
        return Outcome::NotApplicable;
    }

    let strip = if policy.remove_headers_on_success {
        policy.credential_headers()
    } else {
        Vec::new()
    };
    Outcome::Allow { strip }
}

fn user_agent_allow(policy: &Policy, req: &RequestInfo<'_>) -> Outcome {
    if policy.user_agent_allow.matches(req.user_agent()) {
        Outcome::Allow {
            strip: policy.credential_headers(),
        }
    } else {
        Outcome::NotApplicable
    }
}

fn header_token(policy: &Policy, req: &RequestInfo<'_>) -> Outcome {
    let Some(header) = policy.auth_header.as_ref().filter(|_| policy.auth_enabled) else {
        return Outcome::NotApplicable;
    };

    match req.header_bytes(&header.name) {
        Some(value) if policy.tokens.contains(value) => Outcome::Allow {
            strip: strip_on_success(policy, &header.name),
        },
        _ => Outcome::NotApplicable,
    }
}

fn bearer_token(policy: &Policy, req: &RequestInfo<'_>) -> Outcome {
    let Some(header) = policy.bearer_header.as_ref().filter(|_| policy.bearer_enabled) else {
        return Outcome::NotApplicable;
    };

    let token = req
        .header_bytes(&header.name)
        .and_then(|value| policy.bearer.extract(value));

    match token {
        Some(token) if policy.tokens.contains(token) => Outcome::Allow {
            strip: strip_on_success(policy, &header.name),
        },
        _ => Outcome::NotApplicable,
    }
}

fn ip_allowlist(policy: &Policy, req: &RequestInfo<'_>) -> GateResult<Outcome> {
    if policy.allowlist.is_empty() {
        return Ok(Outcome::NotApplicable);
    }

    let candidates = extract_candidate_ips(req.headers())?;

    if policy.allowlist.matches_any(&candidates) {
        Ok(Outcome::Allow {
            strip: policy.credential_headers(),
        })
    } else {
        Ok(Outcome::NotApplicable)
    }
}

fn user_agent_deny(policy: &Policy, req: &RequestInfo<'_>) -> Outcome {
    if policy.user_agent_deny.matches(req.user_agent()) {
        Outcome::Deny {
            message: policy.blacklist_message(),
        }
    } else {
        Outcome::NotApplicable
    }
}

fn strip_on_success(policy: &Policy, name: &HeaderName) -> Vec<HeaderName> {
    if policy.remove_headers_on_success {
        vec![name.clone()]
    } else {
        Vec::new()
    }
}
