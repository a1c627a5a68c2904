//! API token gate middleware.
//!
//! Wraps any downstream service with the [`AccessDecisionEngine`]: allowed
//! requests are forwarded (minus any credential headers the verdict strips),
//! denied requests are answered with the JSON denial body and never reach
//! the downstream service.
//!
//! # Usage
//!
//! ```rust,ignore
//! let gate = ApiTokenAuth::new(&config.gate)?;
//! let app = Router::new().fallback(handler).layer(gate);
//! ```
//!
//! Clients provide a token via either header:
//!
//! ```bash
//! curl -H "X-API-TOKEN: abc123" http://localhost:3000/orders
//! curl -H "Authorization: Bearer abc123" http://localhost:3000/orders
//! ```
//!
//! The remote address in the denial body comes from
//! [`axum::extract::ConnectInfo`], so serve the router with
//! `into_make_service_with_connect_info::<SocketAddr>()`.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response};
use tower::{Layer, Service};

use crate::config::GateConfig;
use crate::error::GateResult;
use crate::observer::DecisionObserver;
use crate::policy::{AccessDecisionEngine, RequestInfo, Verdict};

/// Token gate layer.
#[derive(Clone, Debug)]
pub struct ApiTokenAuth {
    engine: Arc<AccessDecisionEngine>,
}

impl ApiTokenAuth {
    /// Validate `config` and build the layer.
    ///
    /// # Errors
    ///
    /// Any configuration error from [`AccessDecisionEngine::new`].
    pub fn new(config: &GateConfig) -> GateResult<Self> {
        Ok(Self::from_engine(AccessDecisionEngine::new(config)?))
    }

    /// Build the layer with a custom decision observer.
    pub fn with_observer(
        config: &GateConfig,
        observer: Arc<dyn DecisionObserver>,
    ) -> GateResult<Self> {
        Ok(Self::from_engine(AccessDecisionEngine::with_observer(
            config, observer,
        )?))
    }

    pub fn from_engine(engine: AccessDecisionEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &AccessDecisionEngine {
        &self.engine
    }
}

impl<S> Layer<S> for ApiTokenAuth {
    type Service = ApiTokenAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiTokenAuthService {
            inner,
            engine: self.engine.clone(),
        }
    }
}

/// Token gate service wrapper.
#[derive(Clone, Debug)]
pub struct ApiTokenAuthService<S> {
    inner: S,
    engine: Arc<AccessDecisionEngine>,
}

impl<S> Service<Request<Body>> for ApiTokenAuthService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let verdict = self.engine.evaluate(&RequestInfo::from_request(&req));

        match verdict {
            Verdict::Allow { strip, .. } => {
                let headers = req.headers_mut();
                for name in &strip {
                    headers.remove(name);
                }

                // Take the service that was driven to readiness
                let clone = self.inner.clone();
                let mut inner = std::mem::replace(&mut self.inner, clone);
                Box::pin(async move { inner.call(req).await })
            }
            Verdict::Deny {
                message, status, ..
            } => {
                let response =
                    self.engine
                        .denial_response(&message, status, &RequestInfo::from_request(&req));
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
