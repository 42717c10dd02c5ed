use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::tests::common::{get, json_body, location, send, set_cookies, test_app};

#[tokio::test]
async fn test_verification_link_moves_tokens_into_cookie() {
    let backend = MockServer::start().await;
    let (_, app) = test_app(&backend);

    let response = send(&app, get("/en/verify-email?uid=MQ&token=abc-123")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    // query stripped
    assert_eq!(location(&response), "/en/verify-email");

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    let cookie = &cookies[0];
    assert!(cookie.starts_with("verify_context="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=900"));
    assert!(cookie.contains("Path=/en/verify-email"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_reset_link_trailing_slash() {
    let backend = MockServer::start().await;
    let (_, app) = test_app(&backend);

    let response = send(&app, get("/ar/reset-password/?uid=Mg&token=set-1")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/ar/reset-password");
    assert!(set_cookies(&response)[0].starts_with("reset_context="));
}

#[tokio::test]
async fn test_incomplete_link_renders_page() {
    let backend = MockServer::start().await;
    let (_, app) = test_app(&backend);

    let response = send(&app, get("/en/verify-email?uid=MQ")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_legacy_link_to_confirmation() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/users/activation/"))
        .and(body_json(json!({ "uid": "MQ", "token": "abc-123" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backend)
        .await;
    let (_, app) = test_app(&backend);

    let response = send(&app, get("/activation/MQ/abc-123")).await;
    let response = send(&app, get(location(&response))).await;
    assert_eq!(location(&response), "/en/verify-email");
    let stored = set_cookies(&response)[0].split(';').next().unwrap().to_string();

    let confirm = Request::post("/en/verify-email").header("cookie", stored).body(Body::empty()).unwrap();
    let response = send(&app, confirm).await;
    assert_eq!(response.status(), StatusCode::OK);

    let removals = set_cookies(&response);
    assert_eq!(removals.len(), 2);
    assert!(removals.iter().all(|c| c.starts_with("verify_context=") && c.contains("Max-Age=0")));

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
}
