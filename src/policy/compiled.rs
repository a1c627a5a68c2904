//! Validated, compiled form of [`GateConfig`].

use axum::http::header::HeaderName;
use tracing::info;

use super::allowlist::IpAllowlist;
use super::tokens::{BearerExtractor, TokenSet};
use super::user_agent::PatternList;
use crate::config::{DEFAULT_ERROR_MESSAGE, GateConfig};
use crate::error::{GateError, GateResult};

/// A credential header: the parsed name plus the spelling from the
/// configuration, used in denial hints.
#[derive(Debug, Clone)]
pub struct CredentialHeader {
    pub name: HeaderName,
    pub label: String,
}

impl CredentialHeader {
    fn parse(label: &str) -> Option<Self> {
        let name = HeaderName::try_from(label.trim()).ok()?;
        Some(Self {
            name,
            label: label.trim().to_string(),
        })
    }
}

/// Immutable policy evaluated by every rule.
///
/// Built once by [`Policy::compile`]; shared read-only across requests.
#[derive(Debug, Clone)]
pub struct Policy {
    pub(crate) auth_enabled: bool,
    pub(crate) auth_header: Option<CredentialHeader>,
    pub(crate) bearer_enabled: bool,
    pub(crate) bearer_header: Option<CredentialHeader>,
    pub(crate) tokens: TokenSet,
    pub(crate) bearer: BearerExtractor,
    pub(crate) permissive_mode: bool,
    pub(crate) remove_headers_on_success: bool,
    pub(crate) remove_reason_on_failure: bool,
    pub(crate) use_unix_timestamp: bool,
    pub(crate) allowlist: IpAllowlist,
    pub(crate) user_agent_allow: PatternList,
    pub(crate) user_agent_deny: PatternList,
    pub(crate) error_message: String,
}

impl Policy {
    /// Validate and compile a gate configuration.
    ///
    /// # Errors
    ///
    /// - `GateError::NoTokens` if no non-empty token is configured
    /// - `GateError::NoAuthMethod` if both header and bearer auth are off
    /// - `GateError::InvalidHeaderName` if an enabled header name is invalid
    /// - `GateError::InvalidPattern` for the first bad User-Agent pattern
    ///
    /// Invalid allowlist entries are logged and dropped.
    pub fn compile(config: &GateConfig) -> GateResult<Self> {
        let tokens = TokenSet::new(&config.tokens)?;

        if !config.auth_header_enabled && !config.bearer_enabled {
            return Err(GateError::NoAuthMethod);
        }

        let auth_header = enabled_header(config.auth_header_enabled, &config.auth_header_name)?;
        let bearer_header = enabled_header(config.bearer_enabled, &config.bearer_header_name)?;

        let policy = Self {
            auth_enabled: config.auth_header_enabled,
            auth_header,
            bearer_enabled: config.bearer_enabled,
            bearer_header,
            tokens,
            bearer: BearerExtractor::new()?,
            permissive_mode: config.permissive_mode,
            remove_headers_on_success: config.remove_headers_on_success,
            remove_reason_on_failure: config.remove_reason_on_failure,
            use_unix_timestamp: config.use_unix_timestamp,
            allowlist: IpAllowlist::new(&config.allowed_ips),
            user_agent_allow: PatternList::compile(&config.user_agent_allow)?,
            user_agent_deny: PatternList::compile(&config.user_agent_deny)?,
            error_message: if config.error_message.is_empty() {
                DEFAULT_ERROR_MESSAGE.to_string()
            } else {
                config.error_message.clone()
            },
        };

        info!(
            header_auth = policy.auth_enabled,
            bearer_auth = policy.bearer_enabled,
            tokens = policy.tokens.len(),
            allowed_ips = policy.allowlist.len(),
            user_agent_allow = policy.user_agent_allow.len(),
            user_agent_deny = policy.user_agent_deny.len(),
            permissive = policy.permissive_mode,
            "Access policy compiled"
        );

        Ok(policy)
    }

    /// Names of both credential headers, for the rules that strip everything.
    pub(crate) fn credential_headers(&self) -> Vec<HeaderName> {
        [&self.auth_header, &self.bearer_header]
            .into_iter()
            .flatten()
            .map(|h| h.name.clone())
            .collect()
    }

    /// Message for the final deny step, naming the enabled methods.
    pub(crate) fn default_deny_message(&self) -> String {
        let base = &self.error_message;
        if self.remove_reason_on_failure {
            return base.clone();
        }

        let auth = self.auth_header.as_ref().filter(|_| self.auth_enabled);
        let bearer = self.bearer_header.as_ref().filter(|_| self.bearer_enabled);

        match (auth, bearer) {
            (Some(auth), Some(bearer)) => format!(
                "{base}. Provide a valid API Token header using either {}: $token or {}: Bearer $token",
                auth.label, bearer.label
            ),
            (Some(auth), None) => format!(
                "{base}. Provide a valid API Token header using {}: $token",
                auth.label
            ),
            (None, Some(bearer)) => format!(
                "{base}. Provide a valid API Token header using {}: Bearer $token",
                bearer.label
            ),
            // Rejected by compile()
            (None, None) => base.clone(),
        }
    }

    /// Message for a denied User-Agent.
    pub(crate) fn blacklist_message(&self) -> String {
        if self.remove_reason_on_failure {
            self.error_message.clone()
        } else {
            format!("{}. User-Agent is blacklisted", self.error_message)
        }
    }

    pub fn use_unix_timestamp(&self) -> bool {
        self.use_unix_timestamp
    }

    pub fn is_permissive(&self) -> bool {
        self.permissive_mode
    }
}

/// Parse a header name. Must be valid when its method is enabled; a disabled
/// method's name is only kept for stripping if it happens to be valid.
fn enabled_header(enabled: bool, label: &str) -> GateResult<Option<CredentialHeader>> {
    match CredentialHeader::parse(label) {
        Some(header) => Ok(Some(header)),
        None if enabled => Err(GateError::InvalidHeaderName(label.to_string())),
        None => Ok(None),
    }
}
