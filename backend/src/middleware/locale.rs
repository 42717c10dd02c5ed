//! Locale router middleware
//!
//! Keeps a supported locale prefix in every page URL and scopes the
//! resolved locale onto the request task so localized errors work
//! everywhere, including the bypassed `/api` surface.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::ACCEPT_LANGUAGE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::AppState;
use crate::config::LocaleConfig;
use crate::utils::{Locale, locale_from_accept_language, with_locale};

/// Prefixes served without a locale segment.
pub const EXCLUDED_PREFIXES: [&str; 5] = ["/api", "/static", "/media", "/swagger-ui", "/api-docs"];

static LEGACY_ACTIVATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/activation/([^/]+)/([^/]+)/?$").expect("valid regex"));
static LEGACY_RESET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/resetpassword/([^/]+)/([^/]+)/?$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleRoute {
    /// Not a page: no redirect, locale only used for messages
    Bypass,
    /// Already prefixed
    Localized(Locale),
    Redirect { location: String, permanent: bool },
}

/// Locale signals carried by a request, in precedence order.
#[derive(Debug, Default, Clone)]
pub struct LocaleSignals<'a> {
    pub query_override: Option<&'a str>,
    pub cookie: Option<&'a str>,
    pub accept_language: Option<&'a str>,
}

/// Query override, then preference cookie, then Accept-Language (when
/// enabled), then the configured default.
pub fn preferred_locale(settings: &LocaleConfig, signals: &LocaleSignals<'_>) -> Locale {
    signals
        .query_override
        .and_then(Locale::from_tag)
        .or_else(|| signals.cookie.and_then(Locale::from_tag))
        .or_else(|| {
            settings
                .detect_from_header
                .then_some(signals.accept_language)
                .flatten()
                .and_then(locale_from_accept_language)
        })
        .unwrap_or(settings.default)
}

pub fn is_excluded(path: &str) -> bool {
    let excluded_prefix = EXCLUDED_PREFIXES
        .iter()
        .any(|prefix| path == *prefix || path.starts_with(&format!("{}/", prefix)));
    // asset-looking paths such as /favicon.ico or /robots.txt
    let last_segment = path.rsplit('/').next().unwrap_or_default();
    excluded_prefix || last_segment.contains('.')
}

/// Decide what to do with a request path. Pure; re-running it on its own
/// redirect target yields `Localized`.
pub fn route_request(
    path: &str,
    query: Option<&str>,
    preferred: Locale,
    query_param: &str,
) -> LocaleRoute {
    if is_excluded(path) {
        return LocaleRoute::Bypass;
    }

    if let Some((locale, _)) = Locale::split_prefix(path) {
        return LocaleRoute::Localized(locale);
    }

    if path == "/home" || path == "/home/" {
        return LocaleRoute::Redirect { location: format!("/{}", preferred), permanent: true };
    }

    if let Some(caps) = LEGACY_ACTIVATION.captures(path) {
        return LocaleRoute::Redirect {
            location: format!("/{}/verify-email?{}", preferred, token_query(&caps[1], &caps[2])),
            permanent: true,
        };
    }

    if let Some(caps) = LEGACY_RESET.captures(path) {
        return LocaleRoute::Redirect {
            location: format!("/{}/reset-password?{}", preferred, token_query(&caps[1], &caps[2])),
            permanent: true,
        };
    }

    let suffix = if path == "/" { "" } else { path };
    let mut location = format!("/{}{}", preferred, suffix);
    if let Some(rest) = query.map(|q| strip_query_param(q, query_param)).filter(|q| !q.is_empty()) {
        location.push('?');
        location.push_str(&rest);
    }
    LocaleRoute::Redirect { location, permanent: false }
}

// path segments arrive URI-encoded and are valid query text as-is
fn token_query(uid: &str, token: &str) -> String {
    format!("uid={}&token={}", uid, token)
}

fn strip_query_param(query: &str, name: &str) -> String {
    query
        .split('&')
        .filter(|pair| !pair.is_empty() && pair.split('=').next() != Some(name))
        .collect::<Vec<_>>()
        .join("&")
}

fn query_value<'a>(query: Option<&'a str>, name: &str) -> Option<&'a str> {
    query?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then_some(value)
    })
}

/// Middleware resolving the request locale.
pub async fn locale_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let settings = &state.config.locale;
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    let jar = CookieJar::from_headers(req.headers());
    let cookie_locale = jar.get(&settings.cookie_name).map(|c| c.value().to_string());
    let accept_language =
        req.headers().get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok()).map(str::to_string);

    let signals = LocaleSignals {
        query_override: query_value(query.as_deref(), &settings.query_param),
        cookie: cookie_locale.as_deref(),
        accept_language: accept_language.as_deref(),
    };
    let preferred = preferred_locale(settings, &signals);

    match route_request(&path, query.as_deref(), preferred, &settings.query_param) {
        LocaleRoute::Bypass => with_locale(preferred, next.run(req)).await,
        LocaleRoute::Localized(locale) => {
            req.extensions_mut().insert(locale);
            with_locale(locale, next.run(req)).await
        },
        LocaleRoute::Redirect { location, permanent } => {
            tracing::debug!("Locale redirect {} -> {}", path, location);
            if permanent {
                Redirect::permanent(&location).into_response()
            } else {
                Redirect::temporary(&location).into_response()
            }
        },
    }
}
