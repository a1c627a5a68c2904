//! Client IP extraction from proxy headers.
//!
//! Candidate addresses are collected from every `X-Forwarded-For` value first
//! and every `X-Real-IP` value second. Each value is split on commas and each
//! field is trimmed before parsing, so `"203.0.113.50, 70.41.3.18"` yields two
//! candidates.
//!
//! Extraction is all-or-nothing: one field that is not an IPv4/IPv6 address
//! fails the whole call with [`GateError::AddressParse`]. The caller decides
//! what that means; the IP allowlist rule simply stops being applicable.
//!
//! # Security Warning: IP Spoofing Risk
//!
//! **These headers are client-controlled.** Anyone who can reach the gate
//! directly can claim an allowlisted address. Deploy behind a reverse proxy
//! that overwrites (not appends to) these headers:
//!
//! ```nginx
//! proxy_set_header X-Real-IP $remote_addr;
//! proxy_set_header X-Forwarded-For $remote_addr;
//! ```

use std::net::IpAddr;

use axum::http::HeaderMap;
use axum::http::header::HeaderName;

use crate::error::{GateError, GateResult};

/// `X-Forwarded-For` header name.
pub static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// `X-Real-IP` header name.
pub static X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Extract every candidate client IP from the proxy headers.
///
/// Absent headers contribute nothing, so a request without proxy headers
/// yields an empty list.
///
/// # Errors
///
/// Returns `GateError::AddressParse` naming the first field that does not
/// parse, including empty fields such as the one after a trailing comma.
pub fn extract_candidate_ips(headers: &HeaderMap) -> GateResult<Vec<IpAddr>> {
    let mut candidates = Vec::new();

    for name in [&X_FORWARDED_FOR, &X_REAL_IP] {
        for value in headers.get_all(name) {
            let value = value.to_str().map_err(|_| {
                GateError::AddressParse(String::from_utf8_lossy(value.as_bytes()).into_owned())
            })?;

            for field in value.split(',') {
                candidates.push(parse_ip(field)?);
            }
        }
    }

    Ok(candidates)
}

#[inline]
fn parse_ip(field: &str) -> GateResult<IpAddr> {
    let trimmed = field.trim();
    trimmed
        .parse()
        .map_err(|_| GateError::AddressParse(trimmed.to_string()))
}
