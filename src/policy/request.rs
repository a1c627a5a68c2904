use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::header::{HOST, HeaderName, USER_AGENT};
use axum::http::{HeaderMap, Request, Uri};

/// Borrowed view of the parts of a request the policy chain reads.
#[derive(Debug, Clone, Copy)]
pub struct RequestInfo<'a> {
    headers: &'a HeaderMap,
    uri: &'a Uri,
    remote_addr: Option<SocketAddr>,
}

impl<'a> RequestInfo<'a> {
    pub fn new(headers: &'a HeaderMap, uri: &'a Uri) -> Self {
        Self {
            headers,
            uri,
            remote_addr: None,
        }
    }

    /// Build from a request. The peer address is taken from the
    /// `ConnectInfo<SocketAddr>` extension when the server provides it.
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        Self {
            headers: req.headers(),
            uri: req.uri(),
            remote_addr: req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        }
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn headers(&self) -> &'a HeaderMap {
        self.headers
    }

    /// Raw bytes of the first value of `name`.
    pub fn header_bytes(&self, name: &HeaderName) -> Option<&'a [u8]> {
        self.headers.get(name).map(|v| v.as_bytes())
    }

    /// First value of `name`, if present and visible ASCII.
    pub fn header_str(&self, name: &HeaderName) -> Option<&'a str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// User-Agent, or the empty string.
    pub fn user_agent(&self) -> &'a str {
        self.header_str(&USER_AGENT).unwrap_or_default()
    }

    /// `Host` header, falling back to the URI authority (HTTP/2).
    pub fn host(&self) -> &'a str {
        self.header_str(&HOST)
            .or_else(|| self.uri.host())
            .unwrap_or_default()
    }

    /// Path and query as sent by the client.
    pub fn request_uri(&self) -> &'a str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }
}
