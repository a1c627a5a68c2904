//! Router-level tests for the token gate.
//!
//! These drive the full application router (`/health` plus the gated echo
//! downstream) in-process with `tower::ServiceExt::oneshot`.
//!
//! Run with: `cargo test --test gate_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderValue, Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use api_token_gate::{
    AccessDecisionEngine, ApiTokenAuth, AppState, Config, DecisionObserver, GateConfig, GateError,
    RequestInfo, Rule, Verdict, build_router,
};

// =============================================================================
// Helpers
// =============================================================================

fn gate(tokens: &[&str]) -> GateConfig {
    GateConfig {
        tokens: tokens.iter().map(|t| t.to_string()).collect(),
        ..GateConfig::default()
    }
}

fn app(gate_config: GateConfig) -> Router {
    let layer = ApiTokenAuth::new(&gate_config).unwrap();
    let config = Config {
        gate: gate_config,
        ..Config::default()
    };
    build_router(AppState::new(config), layer)
}

struct TestRequest {
    method: Method,
    uri: &'static str,
    headers: Vec<(&'static str, &'static str)>,
    remote: Option<SocketAddr>,
}

impl TestRequest {
    fn get(uri: &'static str) -> Self {
        Self {
            method: Method::GET,
            uri,
            headers: Vec::new(),
            remote: None,
        }
    }

    fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    fn header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    fn remote(mut self, addr: &str) -> Self {
        self.remote = Some(addr.parse().unwrap());
        self
    }

    async fn send(self, app: Router) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        for (name, value) in &self.headers {
            builder = builder.header(*name, *value);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        if let Some(addr) = self.remote {
            req.extensions_mut().insert(ConnectInfo(addr));
        }

        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, content_type, body)
    }
}

fn has_header(echo: &Value, name: &str) -> bool {
    echo["headers"].get(name).is_some()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_is_not_gated() {
    let (status, _, body) = TestRequest::get("/health").send(app(gate(&["abc123"]))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["permissive_mode"], false);
}

// =============================================================================
// Header token
// =============================================================================

#[tokio::test]
async fn test_header_token_forwarded_and_stripped() {
    let config = GateConfig {
        bearer_enabled: false,
        ..gate(&["abc123"])
    };

    let (status, _, echo) = TestRequest::get("/orders")
        .header("x-api-token", "abc123")
        .send(app(config))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(echo["uri"], "/orders");
    assert!(!has_header(&echo, "x-api-token"));
}

#[tokio::test]
async fn test_wrong_header_token_denied_with_hint() {
    let config = GateConfig {
        bearer_enabled: false,
        ..gate(&["abc123"])
    };

    let (status, content_type, body) = TestRequest::get("/orders?page=2")
        .header("x-api-token", "wrong")
        .header("host", "api.example.com")
        .header("user-agent", "curl/8.5.0")
        .remote("203.0.113.7:51234")
        .send(app(config))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        content_type.as_deref(),
        Some("application/json; charset=utf-8")
    );
    assert_eq!(
        body["message"],
        "Access Denied. Provide a valid API Token header using X-API-TOKEN: $token"
    );
    assert_eq!(body["status_code"], 403);
    assert_eq!(body["user-agent"], "curl/8.5.0");
    assert_eq!(body["ip"], "203.0.113.7:51234");
    assert_eq!(body["host"], "api.example.com");
    assert_eq!(body["uri"], "/orders?page=2");
    assert!(body["timestamp"].as_str().unwrap().contains("UTC"));
}

#[tokio::test]
async fn test_header_kept_when_stripping_disabled() {
    let config = GateConfig {
        remove_headers_on_success: false,
        ..gate(&["abc123"])
    };

    let (status, _, echo) = TestRequest::get("/")
        .header("x-api-token", "abc123")
        .send(app(config))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(echo["headers"]["x-api-token"], "abc123");
}

#[tokio::test]
async fn test_custom_header_name() {
    let config = GateConfig {
        auth_header_name: "X-Service-Key".to_string(),
        bearer_enabled: false,
        ..gate(&["k1", "k2"])
    };

    let (ok, _, _) = TestRequest::get("/")
        .header("x-service-key", "k2")
        .send(app(config.clone()))
        .await;
    let (denied, _, body) = TestRequest::get("/")
        .header("x-api-token", "k2")
        .send(app(config))
        .await;

    assert_eq!(ok, StatusCode::OK);
    assert_eq!(denied, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "Access Denied. Provide a valid API Token header using X-Service-Key: $token"
    );
}

#[tokio::test]
async fn test_non_ascii_header_token() {
    let app = app(gate(&["café"]));
    let req = Request::builder()
        .uri("/")
        .header("x-api-token", HeaderValue::from_bytes("café".as_bytes()).unwrap())
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Bearer token
// =============================================================================

#[tokio::test]
async fn test_bearer_token_forwarded() {
    let config = GateConfig {
        auth_header_enabled: false,
        bearer_header_name: "Authorization".to_string(),
        ..gate(&["tok"])
    };

    let (status, _, echo) = TestRequest::get("/")
        .header("authorization", "Bearer tok")
        .send(app(config))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!has_header(&echo, "authorization"));
}

#[tokio::test]
async fn test_lowercase_bearer_prefix_denied() {
    let (status, _, body) = TestRequest::get("/")
        .header("authorization", "bearer abc123")
        .send(app(gate(&["abc123"])))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "Access Denied. Provide a valid API Token header using either X-API-TOKEN: $token or Authorization: Bearer $token"
    );
}

#[tokio::test]
async fn test_bearer_ignored_when_disabled() {
    let config = GateConfig {
        bearer_enabled: false,
        ..gate(&["abc123"])
    };

    let (status, _, _) = TestRequest::get("/")
        .header("authorization", "Bearer abc123")
        .send(app(config))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =============================================================================
// IP allowlist
// =============================================================================

#[tokio::test]
async fn test_allowlisted_ip_bypasses_tokens_and_strips_credentials() {
    let config = GateConfig {
        allowed_ips: vec!["10.0.0.0/24".to_string()],
        ..gate(&["abc123"])
    };

    let (status, _, echo) = TestRequest::get("/")
        .header("x-forwarded-for", "10.0.0.5")
        .header("x-api-token", "wrong")
        .header("authorization", "Bearer wrong")
        .send(app(config))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!has_header(&echo, "x-api-token"));
    assert!(!has_header(&echo, "authorization"));
}

#[tokio::test]
async fn test_ip_outside_range_denied() {
    let config = GateConfig {
        allowed_ips: vec!["10.0.0.0/24".to_string()],
        ..gate(&["abc123"])
    };

    let (status, _, _) = TestRequest::get("/")
        .header("x-forwarded-for", "10.0.1.5")
        .send(app(config))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_real_ip_header_matches_exact_entry() {
    let config = GateConfig {
        allowed_ips: vec!["192.168.1.10".to_string(), "not-an-ip".to_string()],
        ..gate(&["abc123"])
    };

    let (status, _, _) = TestRequest::get("/")
        .header("x-real-ip", "192.168.1.10")
        .send(app(config))
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_ipv4_mapped_forwarded_address_matches_ipv4_entry() {
    let config = GateConfig {
        allowed_ips: vec!["10.0.0.0/24".to_string()],
        ..gate(&["abc123"])
    };

    let (status, _, _) = TestRequest::get("/")
        .header("x-forwarded-for", "::ffff:10.0.0.5")
        .send(app(config))
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_forwarding_header_falls_through_to_deny() {
    let config = GateConfig {
        allowed_ips: vec!["10.0.0.0/24".to_string()],
        ..gate(&["abc123"])
    };

    let (status, _, body) = TestRequest::get("/")
        .header("x-forwarded-for", "10.0.0.5, garbage")
        .send(app(config))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status_code"], 403);
}

#[tokio::test]
async fn test_malformed_forwarding_header_does_not_block_token() {
    let config = GateConfig {
        allowed_ips: vec!["10.0.0.0/24".to_string()],
        ..gate(&["abc123"])
    };

    let (status, _, _) = TestRequest::get("/")
        .header("x-forwarded-for", "garbage")
        .header("x-api-token", "abc123")
        .send(app(config))
        .await;

    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// User-Agent rules
// =============================================================================

#[tokio::test]
async fn test_denied_user_agent_gets_blacklist_message() {
    let config = GateConfig {
        user_agent_deny: vec!["(?i)badbot".to_string()],
        ..gate(&["abc123"])
    };

    let (status, _, body) = TestRequest::get("/")
        .header("user-agent", "BadBot/1.0")
        .send(app(config))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access Denied. User-Agent is blacklisted");
    assert_eq!(body["user-agent"], "BadBot/1.0");
}

#[tokio::test]
async fn test_valid_token_beats_user_agent_deny() {
    let config = GateConfig {
        user_agent_deny: vec!["(?i)badbot".to_string()],
        ..gate(&["abc123"])
    };

    let (status, _, _) = TestRequest::get("/")
        .header("user-agent", "BadBot/1.0")
        .header("x-api-token", "abc123")
        .send(app(config))
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_allowed_user_agent_bypasses_tokens() {
    let config = GateConfig {
        user_agent_allow: vec!["^HealthChecker/".to_string()],
        user_agent_deny: vec!["Checker".to_string()],
        ..gate(&["abc123"])
    };

    let (status, _, echo) = TestRequest::get("/")
        .header("user-agent", "HealthChecker/2.1")
        .header("x-api-token", "leaked")
        .send(app(config))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!has_header(&echo, "x-api-token"));
}

#[tokio::test]
async fn test_reason_suppressed() {
    let config = GateConfig {
        remove_reason_on_failure: true,
        error_message: "Forbidden".to_string(),
        user_agent_deny: vec!["bot".to_string()],
        ..gate(&["abc123"])
    };

    let (_, _, plain) = TestRequest::get("/").send(app(config.clone())).await;
    let (_, _, blacklisted) = TestRequest::get("/")
        .header("user-agent", "bot")
        .send(app(config))
        .await;

    assert_eq!(plain["message"], "Forbidden");
    assert_eq!(blacklisted["message"], "Forbidden");
}

// =============================================================================
// Permissive mode
// =============================================================================

#[tokio::test]
async fn test_permissive_allows_everything() {
    let config = GateConfig {
        permissive_mode: true,
        user_agent_deny: vec![".*".to_string()],
        ..gate(&["abc123"])
    };

    for method in [Method::GET, Method::POST, Method::DELETE] {
        let (status, _, echo) = TestRequest::get("/anything")
            .method(method.clone())
            .header("user-agent", "BadBot/1.0")
            .header("x-api-token", "wrong")
            .send(app(config.clone()))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(echo["method"], method.as_str());
        assert!(!has_header(&echo, "x-api-token"));
    }
}

#[derive(Default)]
struct WouldDeny {
    rules: Mutex<Vec<Rule>>,
}

impl DecisionObserver for WouldDeny {
    fn on_permissive(&self, enforced: &Verdict, _req: &RequestInfo<'_>) {
        if !enforced.is_allow() {
            self.rules.lock().unwrap().push(enforced.rule());
        }
    }
}

#[tokio::test]
async fn test_permissive_reports_would_be_denials() {
    let observer = Arc::new(WouldDeny::default());
    let config = GateConfig {
        permissive_mode: true,
        ..gate(&["abc123"])
    };
    let app = Router::new()
        .fallback(|| async { "downstream" })
        .layer(ApiTokenAuth::with_observer(&config, observer.clone()).unwrap());

    let (allowed, _, _) = TestRequest::get("/")
        .header("x-api-token", "abc123")
        .send(app.clone())
        .await;
    let (bypassed, _, _) = TestRequest::get("/").send(app).await;

    assert_eq!(allowed, StatusCode::OK);
    assert_eq!(bypassed, StatusCode::OK);
    assert_eq!(*observer.rules.lock().unwrap(), vec![Rule::DefaultDeny]);
}

// =============================================================================
// Construction and determinism
// =============================================================================

#[test]
fn test_construction_errors() {
    assert!(matches!(
        AccessDecisionEngine::new(&gate(&[])),
        Err(GateError::NoTokens)
    ));

    let no_method = GateConfig {
        auth_header_enabled: false,
        bearer_enabled: false,
        ..gate(&["abc123"])
    };
    assert!(matches!(
        AccessDecisionEngine::new(&no_method),
        Err(GateError::NoAuthMethod)
    ));

    let bad_regex = GateConfig {
        user_agent_allow: vec!["[unclosed".to_string()],
        ..gate(&["abc123"])
    };
    match AccessDecisionEngine::new(&bad_regex) {
        Err(err @ GateError::InvalidPattern { .. }) => {
            assert!(err.to_string().contains("[unclosed"));
            assert!(err.is_config_error());
        }
        other => panic!("expected InvalidPattern, got {other:?}"),
    }
}

#[tokio::test]
async fn test_identical_configs_give_identical_verdicts() {
    let config = GateConfig {
        allowed_ips: vec!["172.16.0.0/12".to_string()],
        user_agent_deny: vec!["(?i)scanner".to_string()],
        ..gate(&["abc123", "def456"])
    };

    let cases: [Vec<(&'static str, &'static str)>; 4] = [
        vec![("x-api-token", "def456")],
        vec![("x-forwarded-for", "172.20.1.1")],
        vec![("user-agent", "Scanner/1")],
        vec![("authorization", "Bearer nope")],
    ];

    for headers in cases {
        let mut a = TestRequest::get("/");
        let mut b = TestRequest::get("/");
        for (name, value) in &headers {
            a = a.header(*name, *value);
            b = b.header(*name, *value);
        }

        let (first, _, first_body) = a.send(app(config.clone())).await;
        let (second, _, second_body) = b.send(app(config.clone())).await;

        assert_eq!(first, second);
        assert_eq!(first_body["message"], second_body["message"]);
    }
}

#[tokio::test]
async fn test_unix_timestamp_in_denial() {
    let config = GateConfig {
        use_unix_timestamp: true,
        ..gate(&["abc123"])
    };

    let (_, _, body) = TestRequest::get("/").send(app(config)).await;
    let seconds: i64 = body["timestamp"].as_str().unwrap().parse().unwrap();

    assert!(seconds > 1_600_000_000);
}
