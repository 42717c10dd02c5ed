use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::services::backend_client::access_token;
use crate::utils::Locale;

/// Page segments that need a session.
const PROTECTED_PAGES: [&str; 1] = ["/dashboard"];

/// Login page to send the visitor to, if `path` is a protected page.
pub fn login_redirect_for(path: &str) -> Option<String> {
    let (locale, page) = Locale::split_prefix(path)?;
    let protected = PROTECTED_PAGES
        .iter()
        .any(|prefix| page == *prefix || page.starts_with(&format!("{}/", prefix)));
    protected.then(|| format!("/{}/login", locale))
}

/// Page guard.
/// 1. Leaves non-dashboard pages alone
/// 2. Redirects dashboard pages to the localized login page when there is no
///    `access_token` cookie
///
/// The token is not verified here; the backend rejects stale tokens on the
/// first proxied call.
pub async fn dashboard_guard(req: Request, next: Next) -> Response {
    let path = req.uri().path();
    let Some(login) = login_redirect_for(path) else {
        return next.run(req).await;
    };

    let jar = CookieJar::from_headers(req.headers());
    if access_token(&jar).is_some() {
        return next.run(req).await;
    }

    tracing::debug!("No session for {}, redirecting to {}", path, login);
    Redirect::temporary(&login).into_response()
}
