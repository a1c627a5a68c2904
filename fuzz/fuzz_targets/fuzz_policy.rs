//! Fuzz testing for request-derived policy inputs.
//!
//! Everything here is parsed straight from client-controlled headers or
//! from operator configuration, so none of it may panic:
//!
//! - `extract_candidate_ips`: `X-Forwarded-For` / `X-Real-IP` parsing
//! - `BearerExtractor::extract`: bearer token capture
//! - `CidrRange::parse` / `contains`: allowlist entries
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_policy -- -max_total_time=60
//! ```

#![no_main]

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use api_token_gate::middleware::extract_candidate_ips;
use api_token_gate::policy::{BearerExtractor, CidrRange};
use axum::http::{HeaderMap, HeaderValue};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = HeaderValue::from_bytes(data) {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", value.clone());
        headers.insert("x-real-ip", value);
        let _ = extract_candidate_ips(&headers);
    }

    if let Ok(bearer) = BearerExtractor::new()
        && let Some(token) = bearer.extract(data)
    {
        assert!(!token.is_empty());
    }

    if let Ok(s) = std::str::from_utf8(data)
        && let Some(range) = CidrRange::parse(s)
    {
        let _ = range.contains(&IpAddr::V4(Ipv4Addr::LOCALHOST));
        let _ = range.contains(&IpAddr::V6(Ipv6Addr::LOCALHOST));
    }
});
