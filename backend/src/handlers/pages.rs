//! Localized page shell
//!
//! Every page answers with the same minimal document carrying the locale's
//! `lang`/`dir` and a translated title; the client application renders the
//! rest. Form posts to the verification and reset pages confirm the
//! one-time context held in the page-scoped cookie.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Uri},
    response::{Html, IntoResponse, Redirect, Response},
};
use rust_i18n::t;

use crate::AppState;
use crate::handlers::auth::{confirm_email, confirm_reset};
use crate::models::{ResetConfirmRequest, VerifyEmailRequest};
use crate::utils::{ApiError, ApiResult, ContextKind, Locale};

/// Translated title of a known page, `None` for unknown pages.
pub fn page_title(locale: Locale, page: &str) -> Option<String> {
    let locale = locale.as_str();
    let title = match page.trim_end_matches('/') {
        "" => t!("pages.home", locale = locale),
        "/about" => t!("pages.about", locale = locale),
        "/courses" => t!("pages.courses", locale = locale),
        "/creators" => t!("pages.creators", locale = locale),
        "/contact" => t!("pages.contact", locale = locale),
        "/privacy" => t!("pages.privacy", locale = locale),
        "/terms" => t!("pages.terms", locale = locale),
        "/login" => t!("pages.login", locale = locale),
        "/signup" => t!("pages.signup", locale = locale),
        "/verify-email" => t!("pages.verify_email", locale = locale),
        "/reset-password" => t!("pages.reset_password", locale = locale),
        "/dashboard" => t!("pages.dashboard", locale = locale),
        "/dashboard/profile" => t!("pages.dashboard_profile", locale = locale),
        "/dashboard/content" => t!("pages.dashboard_content", locale = locale),
        "/dashboard/payments" => t!("pages.dashboard_payments", locale = locale),
        "/dashboard/admin/users" => t!("pages.dashboard_admin_users", locale = locale),
        "/dashboard/admin/categories" => t!("pages.dashboard_admin_categories", locale = locale),
        "/dashboard/admin/subcategories" => {
            t!("pages.dashboard_admin_subcategories", locale = locale)
        },
        _ => return None,
    };
    Some(title.to_string())
}

pub fn render_shell(locale: Locale, title: &str) -> String {
    let site_name = t!("pages.site_name", locale = locale.as_str());
    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}" dir="{dir}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | {site_name}</title>
<link rel="stylesheet" href="/static/app.css">
</head>
<body>
<div id="app" data-locale="{lang}"></div>
<script type="module" src="/static/app.js"></script>
</body>
</html>
"#,
        lang = locale.as_str(),
        dir = locale.dir().as_str(),
        title = title,
        site_name = site_name,
    )
}

fn split_page(uri: &Uri) -> ApiResult<(Locale, &str)> {
    Locale::split_prefix(uri.path()).ok_or_else(|| ApiError::PageNotFound(uri.path().to_string()))
}

/// `GET /{locale}` and `GET /{locale}/{*page}`
pub async fn render_page(uri: Uri) -> ApiResult<Html<String>> {
    let (locale, page) = split_page(&uri)?;
    let title = page_title(locale, page).ok_or_else(|| ApiError::PageNotFound(page.to_string()))?;
    tracing::debug!("Rendering {} ({})", uri.path(), locale);
    Ok(Html(render_shell(locale, &title)))
}

/// `POST /{locale}/verify-email` and `POST /{locale}/reset-password`.
///
/// These are the only routes the page-scoped context cookie is sent to.
pub async fn submit_page(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let (_, page) = split_page(&uri)?;
    let kind = ContextKind::from_page(page).ok_or_else(|| ApiError::PageNotFound(page.to_string()))?;

    match kind {
        ContextKind::Verify => {
            // form posts without a JSON body rely on the cookie alone
            let payload: VerifyEmailRequest = serde_json::from_slice(&body).unwrap_or_default();
            confirm_email(&state, &headers, payload).await
        },
        ContextKind::Reset => {
            let payload: ResetConfirmRequest = serde_json::from_slice(&body)
                .map_err(|e| ApiError::MalformedBody(e.to_string()))?;
            confirm_reset(&state, &headers, payload).await
        },
    }
}

/// Unmatched routes. `/{locale}/` goes to the locale home page.
pub async fn fallback(uri: Uri) -> Response {
    if let Some((locale, "/")) = Locale::split_prefix(uri.path()) {
        return Redirect::permanent(&format!("/{}", locale)).into_response();
    }
    ApiError::PageNotFound(uri.path().to_string()).into_response()
}
