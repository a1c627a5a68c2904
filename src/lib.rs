//! # API Token Gate
//!
//! HTTP access control for Axum/Tower services. Every request runs through
//! an ordered policy chain and is either forwarded downstream or answered
//! with a JSON `403`:
//!
//! - **Tokens**: a custom header (`X-API-TOKEN: $token`) or a bearer
//!   header (`Authorization: Bearer $token`), compared in constant time
//! - **IP Allowlist**: CIDR ranges matched against `X-Forwarded-For` and
//!   `X-Real-IP`
//! - **User-Agent Rules**: regex allow and deny lists
//! - **Permissive Mode**: log what would be denied, deny nothing
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Trace → ApiTokenAuth)                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  AccessDecisionEngine (Policy + Rule chain + Observer)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Downstream service (echo handler in the binary)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use api_token_gate::{ApiTokenAuth, GateConfig};
//! use axum::Router;
//! use axum::routing::get;
//!
//! # fn main() -> Result<(), api_token_gate::GateError> {
//! let config = GateConfig {
//!     tokens: vec!["abc123".to_string()],
//!     ..GateConfig::default()
//! };
//!
//! let app: Router = Router::new()
//!     .route("/orders", get(|| async { "ok" }))
//!     .layer(ApiTokenAuth::new(&config)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod observer;
pub mod policy;
pub mod routes;
pub mod state;
pub mod utils;

// Re-exports for convenience
pub use config::{Config, GateConfig};
pub use error::{GateError, GateResult};
pub use middleware::{ApiTokenAuth, ApiTokenAuthService};
pub use observer::{DecisionObserver, NoopObserver, TracingObserver};
pub use policy::{AccessDecisionEngine, RequestInfo, Rule, Verdict};
pub use routes::build_router;
pub use state::AppState;
