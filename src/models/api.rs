use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `healthy` while the process serves requests
    pub status: String,
    /// Crate version
    pub version: String,
    /// Seconds since startup
    pub uptime_seconds: u64,
    /// Whether the gate runs in permissive mode
    pub permissive_mode: bool,
    pub timestamp: DateTime<Utc>,
}

/// What the downstream echo service saw of an allowed request.
///
/// Header names are lowercase; repeated headers are joined with `", "`.
#[derive(Debug, Serialize, Deserialize)]
pub struct EchoResponse {
    pub method: String,
    pub uri: String,
    pub host: String,
    pub headers: BTreeMap<String, String>,
}
