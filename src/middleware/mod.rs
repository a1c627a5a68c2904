//! HTTP middleware for API token access control.
//!
//! - **Token Gate**: [`ApiTokenAuth`] runs the access policy chain in front
//!   of any downstream service
//! - **Client IP Extraction**: candidate addresses from `X-Forwarded-For`
//!   and `X-Real-IP` for the IP allowlist
//!
//! # Architecture
//!
//! ```text
//! Request → Trace → ApiTokenAuth ──allow──→ Handler → Response
//!                        │
//!                        └──deny──→ 403 JSON body
//! ```

pub mod auth;
pub mod ip;

pub use auth::{ApiTokenAuth, ApiTokenAuthService};
pub use ip::{X_FORWARDED_FOR, X_REAL_IP, extract_candidate_ips};
