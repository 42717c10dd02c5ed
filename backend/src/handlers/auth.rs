use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Response},
};
use axum_extra::extract::{
    WithRejection,
    cookie::{CookieJar, SignedCookieJar},
};
use rust_i18n::t;
use serde_json::Value;
use validator::Validate;

use crate::AppState;
use crate::handlers::resource::{relay, request_body};
use crate::models::{
    EmailRequest, LoginRequest, LoginResponse, MessageResponse, ResetConfirmRequest,
    SessionEvent, SessionState, SessionStatus, VerifyEmailRequest,
};
use crate::services::backend_client::access_token;
use crate::utils::cookies::{
    USERNAME_COOKIE, access_token_cookie, context_removals, logout_removals,
    refresh_token_cookie, set_cookie_headers, username_cookie,
};
use crate::utils::{ApiError, ApiResult, ContextKind, OneTimeContext, get_locale};

/// Login with username and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session cookies set", body = LoginResponse),
        (status = 400, description = "Rejected by the backend"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    req.validate()?;
    tracing::info!("Login attempt for user: {}", req.username);

    let tokens = state.session_service.login(&req).await?;

    let secure = state.config.cookies.secure;
    let jar = jar
        .add(access_token_cookie(&tokens.access, secure))
        .add(refresh_token_cookie(&tokens.refresh, secure))
        .add(username_cookie(&req.username, secure));

    Ok((
        jar,
        Json(LoginResponse { success: true, username: req.username, uid: tokens.uid, token: tokens.token }),
    ))
}

/// Expire every session and one-time context cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Cookies cleared", body = MessageResponse)
    ),
    tag = "Authentication"
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let state = SessionState::Authenticated.transition(SessionEvent::LoggedOut);
    match jar.get(USERNAME_COOKIE) {
        Some(user) => tracing::info!("User {} logged out ({:?})", user.value(), state),
        None => tracing::debug!("Logout without a session ({:?})", state),
    }

    let message = t!("auth.logged_out", locale = get_locale().as_str()).to_string();
    (AppendHeaders(set_cookie_headers(&logout_removals())), Json(MessageResponse::ok(message)))
}

/// Report whether the caller holds a valid access token
#[utoipa::path(
    get,
    path = "/api/auth/check",
    responses(
        (status = 200, description = "Session status", body = SessionStatus)
    ),
    tag = "Authentication"
)]
pub async fn check(State(state): State<Arc<AppState>>, jar: CookieJar) -> Json<SessionStatus> {
    let token = access_token(&jar);
    let session = state.session_service.check(token.as_deref()).await;
    let authenticated = session.is_authenticated();
    let username = authenticated
        .then(|| jar.get(USERNAME_COOKIE).map(|c| c.value().to_string()))
        .flatten();

    Json(SessionStatus { authenticated, state: session, username })
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Profile as returned by the backend"),
        (status = 401, description = "No access token")
    ),
    tag = "Authentication"
)]
pub async fn get_profile(State(state): State<Arc<AppState>>, jar: CookieJar) -> ApiResult<Response> {
    let token = access_token(&jar).ok_or(ApiError::Unauthenticated)?;
    let response = state.session_service.profile(&token).await?;
    Ok(relay(response))
}

/// Update the current user's profile (JSON or multipart)
#[utoipa::path(
    patch,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Updated profile"),
        (status = 401, description = "No access token")
    ),
    tag = "Authentication"
)]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let token = access_token(&jar).ok_or(ApiError::Unauthenticated)?;
    let body = request_body(&headers, body);
    tracing::info!("Updating profile");
    let response = state.session_service.update_profile(&token, body).await?;
    Ok(relay(response))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = Value,
    responses(
        (status = 201, description = "Account created, activation email sent"),
        (status = 400, description = "Rejected by the backend")
    ),
    tag = "Authentication"
)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(body), _): WithRejection<Json<Value>, ApiError>,
) -> ApiResult<Response> {
    tracing::info!("Signup request");
    let response = state.session_service.signup(body).await?;
    Ok(relay(response))
}

/// Send the activation email again
#[utoipa::path(
    post,
    path = "/api/auth/verify/resend",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Activation email sent", body = MessageResponse),
        (status = 400, description = "Rejected by the backend")
    ),
    tag = "Authentication"
)]
pub async fn resend_activation(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): WithRejection<Json<EmailRequest>, ApiError>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;
    state.session_service.resend_activation(&req.email).await?;
    let message = t!("auth.activation_resent", locale = get_locale().as_str()).to_string();
    Ok(Json(MessageResponse::ok(message)))
}

/// Confirm an email address
///
/// `uid`/`token` come from the body, or from the `verify_context` cookie
/// when the body omits them.
#[utoipa::path(
    post,
    path = "/api/auth/verify",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Rejected by the backend"),
        (status = 401, description = "Missing or invalid verification context"),
        (status = 502, description = "Backend unavailable after retries"),
        (status = 504, description = "Backend timed out after retries")
    ),
    tag = "Authentication"
)]
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Option<Json<VerifyEmailRequest>>,
) -> ApiResult<Response> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    confirm_email(&state, &headers, payload).await
}

/// Request a password reset email
#[utoipa::path(
    post,
    path = "/api/auth/reset",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Reset email sent", body = MessageResponse),
        (status = 400, description = "Rejected by the backend")
    ),
    tag = "Authentication"
)]
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): WithRejection<Json<EmailRequest>, ApiError>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;
    state.session_service.request_password_reset(&req.email).await?;
    let message = t!("auth.password_reset_sent", locale = get_locale().as_str()).to_string();
    Ok(Json(MessageResponse::ok(message)))
}

/// Set a new password
///
/// `uid`/`token` fall back to the `reset_context` cookie.
#[utoipa::path(
    post,
    path = "/api/auth/reset/confirm",
    request_body = ResetConfirmRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Rejected by the backend"),
        (status = 401, description = "Missing or invalid reset context")
    ),
    tag = "Authentication"
)]
pub async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    WithRejection(Json(payload), _): WithRejection<Json<ResetConfirmRequest>, ApiError>,
) -> ApiResult<Response> {
    confirm_reset(&state, &headers, payload).await
}

/// Verification shared by the API route and the page form post.
pub async fn confirm_email(
    state: &AppState,
    headers: &HeaderMap,
    payload: VerifyEmailRequest,
) -> ApiResult<Response> {
    let context = resolve_context(state, headers, ContextKind::Verify, payload.context())?;
    state.verification_service.verify(&context).await?;

    let message = t!("auth.verified", locale = get_locale().as_str()).to_string();
    Ok(consumed(ContextKind::Verify, message))
}

pub async fn confirm_reset(
    state: &AppState,
    headers: &HeaderMap,
    payload: ResetConfirmRequest,
) -> ApiResult<Response> {
    payload.validate()?;
    let context = resolve_context(state, headers, ContextKind::Reset, payload.context())?;
    state
        .session_service
        .confirm_password_reset(&context, &payload.new_password, &payload.re_new_password)
        .await?;

    let message = t!("auth.password_reset_done", locale = get_locale().as_str()).to_string();
    Ok(consumed(ContextKind::Reset, message))
}

/// Explicit pair first, then the signed context cookie.
///
/// A cookie whose signature does not verify counts as an invalid session,
/// a missing one as an expired session.
fn resolve_context(
    state: &AppState,
    headers: &HeaderMap,
    kind: ContextKind,
    explicit: Option<OneTimeContext>,
) -> ApiResult<OneTimeContext> {
    if let Some(context) = explicit {
        return Ok(context);
    }

    let signed = SignedCookieJar::from_headers(headers, state.cookie_key.clone());
    if let Some(cookie) = signed.get(kind.cookie_name()) {
        return OneTimeContext::decode(cookie.value());
    }

    if CookieJar::from_headers(headers).get(kind.cookie_name()).is_some() {
        tracing::warn!("Rejected {} with a bad signature", kind.cookie_name());
        return Err(ApiError::invalid_session("signature mismatch"));
    }

    Err(ApiError::SessionExpired)
}

/// Success body plus removal of the context cookie on every locale path.
fn consumed(kind: ContextKind, message: String) -> Response {
    (AppendHeaders(set_cookie_headers(&context_removals(kind))), Json(MessageResponse::ok(message)))
        .into_response()
}
