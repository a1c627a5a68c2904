//! Token set and bearer extraction.
//!
//! Tokens are opaque shared secrets compared by exact equality. Comparison is
//! constant-time per token and always visits the whole set, so response timing
//! does not reveal which token (if any) was close.

use std::fmt;

use regex::bytes::Regex;
use subtle::{Choice, ConstantTimeEq};
use tracing::warn;

use crate::error::{GateError, GateResult};

/// Bearer form: `Bearer`, exactly one ASCII whitespace character, then the
/// token up to the first `$` (in practice the rest of the value).
///
/// The match is not anchored, so `xBearer tok` also yields `tok`. The token
/// class matches raw bytes, so non-ASCII tokens are captured as sent.
pub const BEARER_PATTERN: &str = r"Bearer[\t\n\f\r ](?P<token>(?-u:[^$])+)";

/// Configured API tokens.
#[derive(Clone)]
pub struct TokenSet {
    tokens: Vec<String>,
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("tokens", &format_args!("<{} redacted>", self.tokens.len()))
            .finish()
    }
}

impl TokenSet {
    /// Build the token set.
    ///
    /// Empty strings are skipped: an absent header must never match.
    ///
    /// # Errors
    ///
    /// Returns `GateError::NoTokens` if no non-empty token remains.
    pub fn new(tokens: &[String]) -> GateResult<Self> {
        let usable: Vec<String> = tokens.iter().filter(|t| !t.is_empty()).cloned().collect();

        if usable.len() != tokens.len() {
            warn!(
                skipped = tokens.len() - usable.len(),
                "Ignoring empty API tokens in configuration"
            );
        }

        if usable.is_empty() {
            return Err(GateError::NoTokens);
        }

        Ok(Self { tokens: usable })
    }

    /// Whether `candidate` equals one of the configured tokens, byte for byte.
    pub fn contains(&self, candidate: impl AsRef<[u8]>) -> bool {
        let candidate = candidate.as_ref();

        self.tokens
            .iter()
            .fold(Choice::from(0), |found, token| {
                found | token.as_bytes().ct_eq(candidate)
            })
            .into()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Extracts the token from a bearer-style header value.
#[derive(Debug, Clone)]
pub struct BearerExtractor {
    pattern: Regex,
}

impl BearerExtractor {
    /// Compile [`BEARER_PATTERN`].
    pub fn new() -> GateResult<Self> {
        let pattern = Regex::new(BEARER_PATTERN).map_err(|source| GateError::InvalidPattern {
            pattern: BEARER_PATTERN.to_string(),
            source,
        })?;

        Ok(Self { pattern })
    }

    /// The captured token, or `None` if the value is not in bearer form.
    pub fn extract<'a>(&self, value: &'a [u8]) -> Option<&'a [u8]> {
        self.pattern
            .captures(value)
            .and_then(|caps| caps.name("token"))
            .map(|m| m.as_bytes())
    }
}
