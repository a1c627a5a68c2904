use thiserror::Error;

/// Gate-wide error types.
///
/// # Construction Errors
///
/// Everything except [`GateError::AddressParse`] and
/// [`GateError::Serialization`] is raised while building the engine and is
/// fatal to startup:
///
/// - `NoTokens` - no usable API token configured
/// - `NoAuthMethod` - neither header nor bearer authentication enabled
/// - `InvalidPattern` - a User-Agent regex failed to compile
/// - `InvalidHeaderName` - a configured header name is not a valid HTTP header
/// - `Config` - an environment variable or config file could not be parsed
///
/// # Per-Request Errors
///
/// - `AddressParse` - a forwarding header carried something that is not an IP;
///   only the IP allowlist rule is affected
/// - `Serialization` - the denial body could not be encoded; logged only
#[derive(Error, Debug)]
pub enum GateError {
    #[error("Must specify at least one valid api token in plugin configurations")]
    NoTokens,

    #[error("Must specify either authenticationHeader or bearerHeader in dynamic configuration")]
    NoAuthMethod,

    #[error("Invalid User-Agent pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid header name `{0}`")]
    InvalidHeaderName(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid IP address in forwarding header: `{0}`")]
    AddressParse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GateError {
    /// Whether this error can only occur while constructing the engine.
    pub fn is_config_error(&self) -> bool {
        !matches!(self, Self::AddressParse(_) | Self::Serialization(_))
    }

    /// Short, stable label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoTokens => "no_tokens",
            Self::NoAuthMethod => "no_auth_method",
            Self::InvalidPattern { .. } => "invalid_pattern",
            Self::InvalidHeaderName(_) => "invalid_header_name",
            Self::Config(_) => "config",
            Self::AddressParse(_) => "address_parse",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Convenience type alias for Results with GateError.
pub type GateResult<T> = Result<T, GateError>;
