use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::tests::common::{
    get, json_body, post_json, send, set_cookies, signed_context_cookie, test_app,
};
use crate::utils::{ContextKind, Locale, OneTimeContext};

#[tokio::test]
async fn test_login_sets_session_cookies() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/jwt/create/"))
        .and(body_json(json!({ "username": "a", "password": "b" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "X", "refresh": "Y" })))
        .expect(1)
        .mount(&backend)
        .await;
    let (_, app) = test_app(&backend);

    let response =
        send(&app, post_json("/api/auth/login", &json!({ "username": "a", "password": "b" }))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 3);
    assert!(cookies.iter().any(|c| c.starts_with("access_token=X;") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("refresh_token=Y;") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("username=a;") && !c.contains("HttpOnly")));

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["username"], "a");
    assert!(body.get("uid").is_none());
}

#[tokio::test]
async fn test_login_rejection_is_relayed() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/jwt/create/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "No active account found with the given credentials" })),
        )
        .expect(1)
        .mount(&backend)
        .await;
    let (_, app) = test_app(&backend);

    let response =
        send(&app, post_json("/api/auth/login", &json!({ "username": "a", "password": "bad" }))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());

    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No active account found with the given credentials");
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let backend = MockServer::start().await;
    let (_, app) = test_app(&backend);

    let response =
        send(&app, post_json("/api/auth/login", &json!({ "username": "", "password": "b" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], 4001);
}

#[tokio::test]
async fn test_unreadable_bodies_get_localized_errors() {
    let backend = MockServer::start().await;
    let (_, app) = test_app(&backend);

    let request = Request::post("/api/auth/login")
        .header("content-type", "application/json")
        .header("accept-language", "ar")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], 4002);
    assert!(!body["message"].as_str().unwrap().contains("JSON"));

    // missing content type
    let request = Request::post("/api/auth/reset")
        .body(Body::from(r#"{"email":"a@example.com"}"#))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], 4002);
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let backend = MockServer::start().await;
    let (_, app) = test_app(&backend);

    // idempotent: no session at all
    for _ in 0..2 {
        let request = Request::post("/api/auth/logout").body(Body::empty()).unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 7);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
        for name in ["access_token=", "refresh_token=", "username=", "verify_context=", "reset_context="] {
            assert!(cookies.iter().any(|c| c.starts_with(name)), "missing {}", name);
        }
    }
}

#[tokio::test]
async fn test_check_states() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/jwt/verify/"))
        .and(body_json(json!({ "token": "good" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/jwt/verify/"))
        .and(body_json(json!({ "token": "stale" })))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Token is invalid or expired" })),
        )
        .mount(&backend)
        .await;
    let (_, app) = test_app(&backend);

    let body = json_body(send(&app, get("/api/auth/check")).await).await;
    assert_eq!(body, json!({ "authenticated": false, "state": "anonymous" }));

    let request = Request::get("/api/auth/check")
        .header("cookie", "access_token=good; username=a")
        .body(Body::empty())
        .unwrap();
    let body = json_body(send(&app, request).await).await;
    assert_eq!(body, json!({ "authenticated": true, "state": "authenticated", "username": "a" }));

    let request = Request::get("/api/auth/check")
        .header("cookie", "access_token=stale; refresh_token=R")
        .body(Body::empty())
        .unwrap();
    let body = json_body(send(&app, request).await).await;
    assert_eq!(body, json!({ "authenticated": false, "state": "session_expired" }));
}

#[tokio::test]
async fn test_profile_requires_session() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/users/me/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "username": "a" })))
        .expect(1)
        .mount(&backend)
        .await;
    let (_, app) = test_app(&backend);

    let response = send(&app, get("/api/auth/profile")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request =
        Request::get("/api/auth/profile").header("cookie", "access_token=X").body(Body::empty()).unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "username": "a" }));
}

#[tokio::test]
async fn test_verification_rejection_keeps_context() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/users/activation/"))
        .and(body_json(json!({ "uid": "u1", "token": "t1" })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "detail": "Invalid token" })))
        .expect(1)
        .mount(&backend)
        .await;
    let (_, app) = test_app(&backend);

    let response =
        send(&app, post_json("/api/auth/verify", &json!({ "uid": "u1", "token": "t1" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookies(&response).is_empty());

    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn test_verification_from_cookie() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/users/activation/"))
        .and(body_json(json!({ "uid": "MQ", "token": "abc" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backend)
        .await;
    let (state, app) = test_app(&backend);

    let context = OneTimeContext { uid: "MQ".to_string(), token: "abc".to_string() };
    let cookie = signed_context_cookie(&state, ContextKind::Verify, Locale::Ar, &context);

    let request = Request::post("/ar/verify-email").header("cookie", cookie).body(Body::empty()).unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("verify_context=") && c.contains("Path=/ar/verify-email")));

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_verification_without_context() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/users/activation/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&backend)
        .await;
    let (_, app) = test_app(&backend);

    let request = Request::post("/en/verify-email").body(Body::empty()).unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], 1003);

    let request = Request::post("/en/verify-email")
        .header("cookie", "verify_context=forged")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], 1002);
}

#[tokio::test]
async fn test_password_reset_confirm_from_cookie() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/users/reset_password_confirm/"))
        .and(body_json(json!({
            "uid": "Mg",
            "token": "set-1",
            "new_password": "n3w-Secret",
            "re_new_password": "n3w-Secret",
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backend)
        .await;
    let (state, app) = test_app(&backend);

    let context = OneTimeContext { uid: "Mg".to_string(), token: "set-1".to_string() };
    let cookie = signed_context_cookie(&state, ContextKind::Reset, Locale::En, &context);

    let request = Request::post("/en/reset-password")
        .header("cookie", cookie)
        .header("content-type", "application/json")
        .body(Body::from(json!({ "new_password": "n3w-Secret", "re_new_password": "n3w-Secret" }).to_string()))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).iter().all(|c| c.starts_with("reset_context=")));
}

#[tokio::test]
async fn test_password_reset_request_and_resend() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/users/reset_password/"))
        .and(body_json(json!({ "email": "a@example.com" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/users/resend_activation/"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backend)
        .await;
    let (_, app) = test_app(&backend);

    let body = json!({ "email": "a@example.com" });
    let response = send(&app, post_json("/api/auth/reset", &body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["success"], true);

    let response = send(&app, post_json("/api/auth/verify/resend", &body)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signup_relays_backend_answer() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/users/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "email": ["user with this email already exists."],
            "password": ["This password is too short."]
        })))
        .expect(1)
        .mount(&backend)
        .await;
    let (_, app) = test_app(&backend);

    let response = send(
        &app,
        post_json("/api/auth/signup", &json!({ "email": "a@example.com", "password": "x" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["message"],
        "email: user with this email already exists.; password: This password is too short."
    );
}
