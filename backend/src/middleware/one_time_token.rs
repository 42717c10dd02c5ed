//! One-time token interceptor
//!
//! Email links land on `/{locale}/verify-email?uid=..&token=..` (or
//! `/reset-password`). The pair is moved into a signed, HttpOnly cookie
//! scoped to that page and the browser is sent back to the clean URL.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;

use crate::AppState;
use crate::utils::cookies::context_cookie;
use crate::utils::{ContextKind, Locale, OneTimeContext};

/// Link that carries a usable one-time pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedLink {
    pub kind: ContextKind,
    /// Clean path the cookie is scoped to and the browser is sent back to
    pub path: String,
    pub context: OneTimeContext,
}

/// Match a page request against the verification/reset pages.
pub fn intercept(path: &str, query: Option<&str>) -> Option<InterceptedLink> {
    let (locale, rest) = Locale::split_prefix(path)?;
    let kind = ContextKind::from_page(rest)?;

    let mut uid = None;
    let mut token = None;
    for pair in query?.split('&') {
        let Some((key, value)) = pair.split_once('=') else { continue };
        let value = urlencoding::decode(value).ok();
        match key {
            "uid" => uid = value,
            "token" => token = value,
            _ => {},
        }
    }

    let context = OneTimeContext::from_parts(uid.as_deref(), token.as_deref())?;
    Some(InterceptedLink { kind, path: kind.scoped_path(locale), context })
}

pub async fn one_time_token_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }

    let Some(link) = intercept(req.uri().path(), req.uri().query()) else {
        return next.run(req).await;
    };

    let jar = SignedCookieJar::from_headers(req.headers(), state.cookie_key.clone());
    let redirect = Redirect::temporary(&link.path);

    match link.context.encode() {
        Ok(encoded) => {
            let cookie = context_cookie(link.kind, &link.path, encoded, state.config.cookies.secure);
            tracing::info!("Stored {} for {}", link.kind.cookie_name(), link.path);
            (jar.add(cookie), redirect).into_response()
        },
        Err(e) => {
            // confirmation will report an expired session
            tracing::error!("Failed to store {}: {}", link.kind.cookie_name(), e);
            redirect.into_response()
        },
    }
}
