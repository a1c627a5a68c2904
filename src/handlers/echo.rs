//! Downstream echo service.
//!
//! Stands in for the protected upstream: every gated request that is
//! allowed lands here and gets back what arrived, which makes header
//! stripping observable.

use std::collections::BTreeMap;

use axum::Json;
use axum::http::header::HOST;
use axum::http::{HeaderMap, Method, Uri};
use tracing::instrument;

use crate::models::EchoResponse;

/// Echo the method, URI, host and headers of the request.
#[instrument(skip(headers))]
pub async fn echo(method: Method, uri: Uri, headers: HeaderMap) -> Json<EchoResponse> {
    let mut echoed: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in &headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        echoed
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }

    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or_default()
        .to_string();

    Json(EchoResponse {
        method: method.to_string(),
        uri: uri.to_string(),
        host,
        headers: echoed,
    })
}
