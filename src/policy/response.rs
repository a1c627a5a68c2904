//! Denial response body.
//!
//! # Wire Format
//!
//! ```json
//! {
//!   "message": "Access Denied. Provide a valid API Token header using X-API-TOKEN: $token",
//!   "status_code": 403,
//!   "timestamp": "Mon Jan  2 15:04:05 UTC 2006",
//!   "user-agent": "curl/8.5.0",
//!   "ip": "203.0.113.7:51234",
//!   "host": "api.example.com",
//!   "uri": "/orders?page=2"
//! }
//! ```

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::request::RequestInfo;
use crate::error::GateResult;

/// Content type of every denial.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Human-readable timestamp layout, e.g. `Mon Jan  2 15:04:05 UTC 2006`.
const DATE_FORMAT: &str = "%a %b %e %H:%M:%S UTC %Y";

/// JSON body written on every denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DenialResponse {
    pub message: String,
    pub status_code: u16,
    pub timestamp: String,
    #[serde(rename = "user-agent")]
    pub user_agent: String,
    /// Peer address of the connection (`ip:port`), empty when unknown
    pub ip: String,
    pub host: String,
    pub uri: String,
}

impl DenialResponse {
    pub fn new(
        message: impl Into<String>,
        status: StatusCode,
        timestamp: String,
        req: &RequestInfo<'_>,
    ) -> Self {
        Self {
            message: message.into(),
            status_code: status.as_u16(),
            timestamp,
            user_agent: req.user_agent().to_string(),
            ip: req
                .remote_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_default(),
            host: req.host().to_string(),
            uri: req.request_uri().to_string(),
        }
    }

    /// Serialize as a single newline-terminated JSON line.
    pub fn to_json(&self) -> GateResult<Vec<u8>> {
        let mut body = serde_json::to_vec(self)?;
        body.push(b'\n');
        Ok(body)
    }
}

/// Format `now` as Unix seconds or as a fixed-layout UTC date.
pub fn format_timestamp(now: DateTime<Utc>, unix: bool) -> String {
    if unix {
        now.timestamp().to_string()
    } else {
        now.format(DATE_FORMAT).to_string()
    }
}
