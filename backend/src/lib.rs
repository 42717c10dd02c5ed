//! Localized web gateway for the academy learning platform.
//!
//! Resolves the locale of every page request, moves one-time email link
//! tokens into signed page-scoped cookies, and relays the `/api` surface to
//! the platform backend with the caller's session attached.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    middleware as axum_middleware,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;

rust_i18n::i18n!("locales", fallback = "en");

use crate::config::Config;
use crate::handlers::{auth, media, pages, resource};
use crate::services::{
    BackendClient, ListCache, MediaService, ProxyService, SessionService, VerificationService,
};

pub struct AppState {
    pub config: Arc<Config>,
    /// Signs the one-time context cookies
    pub cookie_key: Key,
    pub proxy_service: Arc<ProxyService>,
    pub session_service: Arc<SessionService>,
    pub verification_service: Arc<VerificationService>,
    pub media_service: Arc<MediaService>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let cookie_key = Key::try_from(config.cookies.secret.as_bytes())
            .map_err(|e| anyhow!("Invalid cookie secret: {}", e))?;

        let backend = Arc::new(BackendClient::new(&config.backend)?);
        let cache = ListCache::new(Duration::from_secs(config.cache.list_ttl_secs));
        let proxy_service = Arc::new(ProxyService::new(Arc::clone(&backend), cache));
        let session_service = Arc::new(SessionService::new(Arc::clone(&backend)));
        let verification_service =
            Arc::new(VerificationService::new(Arc::clone(&backend), &config.verification));
        let media_service =
            Arc::new(MediaService::new(config.media_host(), config.backend.timeout_secs)?);

        tracing::info!(
            "Backend: {} (media host: {})",
            config.backend.base_url,
            config.media_host().unwrap_or_else(|| "none".to_string())
        );

        Ok(Self {
            config: Arc::new(config),
            cookie_key,
            proxy_service,
            session_service,
            verification_service,
            media_service,
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::check,
        handlers::auth::get_profile,
        handlers::auth::update_profile,
        handlers::auth::signup,
        handlers::auth::resend_activation,
        handlers::auth::verify_email,
        handlers::auth::request_password_reset,
        handlers::auth::confirm_password_reset,
        handlers::media::get_media,
    ),
    components(schemas(
        models::LoginRequest,
        models::LoginResponse,
        models::MessageResponse,
        models::SessionState,
        models::SessionStatus,
        models::VerifyEmailRequest,
        models::EmailRequest,
        models::ResetConfirmRequest,
    )),
    tags(
        (name = "Authentication", description = "Session cookies and account flows"),
        (name = "Media", description = "Uploaded media relay")
    ),
    info(
        title = "Academy Gateway API",
        version = "1.0.0",
        description = "Localized gateway in front of the academy platform backend"
    )
)]
pub struct ApiDoc;

/// Full application router.
///
/// Layers, outermost first: CORS, request tracing, locale router, one-time
/// token interceptor. The dashboard guard only wraps page routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let page_routes = Router::new()
        .route("/:locale", get(pages::render_page))
        .route("/:locale/*page", get(pages::render_page).post(pages::submit_page))
        .route_layer(axum_middleware::from_fn(middleware::dashboard_guard));

    let auth_routes = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/check", get(auth::check))
        .route("/api/auth/profile", get(auth::get_profile).patch(auth::update_profile))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/verify", post(auth::verify_email))
        .route("/api/auth/verify/resend", post(auth::resend_activation))
        .route("/api/auth/reset", post(auth::request_password_reset))
        .route("/api/auth/reset/confirm", post(auth::confirm_password_reset));

    let mut app = Router::new()
        .merge(page_routes)
        .merge(auth_routes)
        .merge(resource::routes())
        .route("/api/media/*path", get(media::get_media))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let static_config = &state.config.static_config;
    if static_config.enabled {
        tracing::info!("Serving static assets from {}", static_config.web_root);
        app = app.nest_service("/static", ServeDir::new(&static_config.web_root));
    }

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    app.fallback(pages::fallback)
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::one_time_token_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(Arc::clone(&state), middleware::locale_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
