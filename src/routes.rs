//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP request/response logging
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │    Body Limit    │
//! └────────┬─────────┘
//!          │
//!          ├── /health ─────────→ health_check
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   ApiTokenAuth   │ ← 403 JSON if denied
//! └────────┬─────────┘
//!          │
//!          ▼
//!      echo (any other path)
//! ```

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::middleware::ApiTokenAuth;
use crate::state::AppState;

/// Build the application router.
///
/// `/health` is served without the gate. Every other path and method goes
/// through `gate` to the echo downstream.
pub fn build_router(state: AppState, gate: ApiTokenAuth) -> Router {
    info!(
        max_size_mb = state.config.max_request_body_size / (1024 * 1024),
        "Request body size limit configured"
    );
    let body_limit = DefaultBodyLimit::max(state.config.max_request_body_size);

    let gated = Router::new().fallback(handlers::echo).layer(gate);

    Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .merge(gated)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
}
