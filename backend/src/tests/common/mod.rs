// Common test utilities and helpers

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::MockServer;

use crate::config::Config;
use crate::utils::cookies::context_cookie;
use crate::utils::{ContextKind, Locale, OneTimeContext};
use crate::{AppState, build_router};

pub const TEST_COOKIE_SECRET: &str =
    "test-cookie-secret-0123456789abcdefghijklmnopqrstuvwxyz-0123456789abcdef";

/// Configuration pointing every outbound call at the mock backend.
pub fn test_config(backend: &MockServer) -> Config {
    let mut config = Config::default();
    config.backend.base_url = backend.uri();
    config.backend.timeout_secs = 5;
    config.cookies.secret = TEST_COOKIE_SECRET.to_string();
    config.verification.attempt_timeout_secs = 1;
    config.verification.backoff_ms = 10;
    config.static_config.enabled = false;
    config.logging.file = None;
    config
}

pub fn test_state(config: Config) -> Arc<AppState> {
    Arc::new(AppState::new(config).expect("Failed to build test state"))
}

pub fn test_app(backend: &MockServer) -> (Arc<AppState>, Router) {
    let state = test_state(test_config(backend));
    let router = build_router(Arc::clone(&state));
    (state, router)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("Router failed")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}

pub async fn text_body(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

pub fn location(response: &Response) -> &str {
    response.headers()["location"].to_str().unwrap()
}

/// `name=value` pair of a context cookie signed with the state's key, ready
/// for a `Cookie` request header.
pub fn signed_context_cookie(
    state: &AppState,
    kind: ContextKind,
    locale: Locale,
    context: &OneTimeContext,
) -> String {
    let cookie = context_cookie(kind, &kind.scoped_path(locale), context.encode().unwrap(), false);
    let jar = SignedCookieJar::new(state.cookie_key.clone()).add(cookie);
    let response = (jar, ()).into_response();
    let header = response.headers()[SET_COOKIE].to_str().unwrap();
    header.split(';').next().unwrap().to_string()
}
