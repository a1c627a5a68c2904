//! Configuration loaded from environment variables or a JSON document.
//!
//! # Configuration Hierarchy
//!
//! [`Config`] holds the server process settings and embeds the [`GateConfig`]
//! consumed by the access decision engine. Everything is read from environment
//! variables with defaults suitable for development; a `.env` file is honoured.
//!
//! When `GATE_CONFIG_FILE` is set, the gate section is loaded from that JSON
//! file instead of the per-field variables below.
//!
//! # Gate Configuration
//!
//! - `API_TOKENS`: Comma-separated list of accepted tokens (required)
//! - `AUTH_HEADER_ENABLED` / `AUTH_HEADER_NAME`: Token header (default: `true` / `X-API-TOKEN`)
//! - `BEARER_ENABLED` / `BEARER_HEADER_NAME`: Bearer header (default: `true` / `Authorization`)
//! - `REMOVE_HEADERS_ON_SUCCESS`: Strip credentials before forwarding (default: `true`)
//! - `REMOVE_REASON_ON_FAILURE`: Hide header hints in denials (default: `false`)
//! - `PERMISSIVE_MODE`: Allow everything, observe only (default: `false`)
//! - `TIMESTAMP_UNIX`: Unix seconds in denial timestamps (default: `false`)
//! - `ALLOWED_IPS`: Comma-separated addresses or CIDR blocks
//! - `USER_AGENT_ALLOW` / `USER_AGENT_DENY`: JSON arrays of regex patterns
//! - `ERROR_MESSAGE`: Base denial message (default: `Access Denied`)

use std::env;
use std::path::Path;

use serde::Deserialize;

use crate::error::{GateError, GateResult};

/// Default name of the token header.
pub const DEFAULT_AUTH_HEADER_NAME: &str = "X-API-TOKEN";

/// Default name of the bearer header.
pub const DEFAULT_BEARER_HEADER_NAME: &str = "Authorization";

/// Default base message for denials.
pub const DEFAULT_ERROR_MESSAGE: &str = "Access Denied";

/// Raw gate configuration, validated once when the engine is built.
///
/// JSON field names follow the plugin configuration format, so an existing
/// middleware definition can be loaded with [`GateConfig::from_json`]:
///
/// ```json
/// {
///   "tokens": ["abc123"],
///   "bearerHeader": false,
///   "whitelistIPs": ["10.0.0.0/24"],
///   "blacklistUserAgents": ["(?i)badbot"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Accept tokens in `auth_header_name`
    #[serde(rename = "authenticationHeader")]
    pub auth_header_enabled: bool,

    /// Header carrying the raw token (default: "X-API-TOKEN")
    #[serde(rename = "authenticationHeaderName")]
    pub auth_header_name: String,

    /// Accept `Bearer <token>` in `bearer_header_name`
    #[serde(rename = "bearerHeader")]
    pub bearer_enabled: bool,

    /// Header carrying the bearer form (default: "Authorization")
    #[serde(rename = "bearerHeaderName")]
    pub bearer_header_name: String,

    /// Accepted tokens, compared by exact equality
    pub tokens: Vec<String>,

    /// Allow every request; rules are still evaluated for observation
    #[serde(rename = "permissiveMode")]
    pub permissive_mode: bool,

    /// Delete the matched credential header before forwarding
    #[serde(rename = "removeHeadersOnSuccess")]
    pub remove_headers_on_success: bool,

    /// Send only the base error message, without header hints
    #[serde(rename = "removeTokenNameOnError")]
    pub remove_reason_on_failure: bool,

    /// Denial timestamps as Unix seconds instead of a date string
    #[serde(rename = "timestampUnix")]
    pub use_unix_timestamp: bool,

    /// Addresses or CIDR blocks allowed without a token
    #[serde(rename = "whitelistIPs")]
    pub allowed_ips: Vec<String>,

    /// User-Agent patterns allowed without a token
    #[serde(rename = "whitelistUserAgents")]
    pub user_agent_allow: Vec<String>,

    /// User-Agent patterns that get a dedicated denial message
    #[serde(rename = "blacklistUserAgents")]
    pub user_agent_deny: Vec<String>,

    /// Base denial message
    #[serde(rename = "authenticationErrorMsg")]
    pub error_message: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            auth_header_enabled: true,
            auth_header_name: DEFAULT_AUTH_HEADER_NAME.to_string(),
            bearer_enabled: true,
            bearer_header_name: DEFAULT_BEARER_HEADER_NAME.to_string(),
            tokens: Vec::new(),
            permissive_mode: false,
            remove_headers_on_success: true,
            remove_reason_on_failure: false,
            use_unix_timestamp: false,
            allowed_ips: Vec::new(),
            user_agent_allow: Vec::new(),
            user_agent_deny: Vec::new(),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

impl GateConfig {
    /// Load the gate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Config` if a variable is present but malformed.
    /// Semantic checks (tokens, auth methods, patterns) happen when the
    /// engine is constructed.
    pub fn from_env() -> GateResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load the gate configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> GateResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            auth_header_enabled: parse_var(&lookup, "AUTH_HEADER_ENABLED", true)?,
            auth_header_name: lookup("AUTH_HEADER_NAME").unwrap_or(defaults.auth_header_name),
            bearer_enabled: parse_var(&lookup, "BEARER_ENABLED", true)?,
            bearer_header_name: lookup("BEARER_HEADER_NAME")
                .unwrap_or(defaults.bearer_header_name),
            tokens: parse_list(lookup("API_TOKENS")),
            permissive_mode: parse_var(&lookup, "PERMISSIVE_MODE", false)?,
            remove_headers_on_success: parse_var(&lookup, "REMOVE_HEADERS_ON_SUCCESS", true)?,
            remove_reason_on_failure: parse_var(&lookup, "REMOVE_REASON_ON_FAILURE", false)?,
            use_unix_timestamp: parse_var(&lookup, "TIMESTAMP_UNIX", false)?,
            allowed_ips: parse_list(lookup("ALLOWED_IPS")),
            user_agent_allow: parse_patterns(lookup("USER_AGENT_ALLOW"), "USER_AGENT_ALLOW")?,
            user_agent_deny: parse_patterns(lookup("USER_AGENT_DENY"), "USER_AGENT_DENY")?,
            error_message: lookup("ERROR_MESSAGE").unwrap_or(defaults.error_message),
        })
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> GateResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| GateError::Config(format!("Invalid gate configuration: {e}")))
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> GateResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GateError::Config(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }
}

/// Log output format for the server binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}', expected 'pretty' or 'json'")),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Gateway will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    /// Maximum request body size in bytes (default: 10MB)
    pub max_request_body_size: usize,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Log output format (default: pretty)
    pub log_format: LogFormat,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,

    // =========================================================================
    // Gate Configuration
    // =========================================================================
    /// Access decision engine settings
    pub gate: GateConfig,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Config` if any value is invalid
    /// (e.g., non-numeric PORT value, unreadable GATE_CONFIG_FILE).
    pub fn from_env() -> GateResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> GateResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gate = match lookup("GATE_CONFIG_FILE").filter(|p| !p.is_empty()) {
            Some(path) => GateConfig::from_json_file(path)?,
            None => GateConfig::from_lookup(&lookup)?,
        };

        let config = Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "PORT", 3000)?,
            max_request_body_size: parse_var(
                &lookup,
                "MAX_REQUEST_BODY_SIZE",
                10 * 1024 * 1024,
            )?,
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            log_format: parse_var(&lookup, "LOG_FORMAT", LogFormat::Pretty)?,
            metrics_port: parse_var(&lookup, "METRICS_PORT", 9090)?,
            gate,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate server settings. Gate settings are validated by the engine.
    fn validate(&self) -> GateResult<()> {
        if self.max_request_body_size == 0 {
            return Err(GateError::Config(
                "MAX_REQUEST_BODY_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        self.metrics_enabled()
            .then(|| std::net::SocketAddr::from(([0, 0, 0, 0], self.metrics_port)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_request_body_size: 10 * 1024 * 1024, // 10MB
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: 9090,
            gate: GateConfig::default(),
        }
    }
}

/// Parse a variable into the specified type with a default value.
fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> GateResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| GateError::Config(format!("Invalid {name}: {e}"))),
        None => Ok(default),
    }
}

/// Split a comma-separated value, dropping blanks.
fn parse_list(value: Option<String>) -> Vec<String> {
    value
        .map(|s| {
            s.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a JSON array of regex patterns. Patterns may contain commas.
fn parse_patterns(value: Option<String>, name: &str) -> GateResult<Vec<String>> {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| {
            GateError::Config(format!("Invalid {name}: expected a JSON array of strings: {e}"))
        }),
        None => Ok(Vec::new()),
    }
}
