//! Cookie names, lifetimes and builders shared by the session manager and
//! the one-time token interceptor.

use axum::http::{HeaderName, header::SET_COOKIE};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use super::error::{ApiError, ApiResult};
use super::i18n::Locale;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const USERNAME_COOKIE: &str = "username";

pub const ACCESS_TOKEN_MAX_AGE: Duration = Duration::days(7);
pub const REFRESH_TOKEN_MAX_AGE: Duration = Duration::days(30);
pub const CONTEXT_MAX_AGE: Duration = Duration::seconds(900);

/// The two flows that carry a one-time `uid`/`token` pair from an email link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Verify,
    Reset,
}

impl ContextKind {
    pub const ALL: [ContextKind; 2] = [ContextKind::Verify, ContextKind::Reset];

    pub const fn cookie_name(self) -> &'static str {
        match self {
            Self::Verify => "verify_context",
            Self::Reset => "reset_context",
        }
    }

    /// Page segment (after the locale prefix) that receives the email link.
    pub const fn page(self) -> &'static str {
        match self {
            Self::Verify => "/verify-email",
            Self::Reset => "/reset-password",
        }
    }

    pub fn from_page(page: &str) -> Option<Self> {
        let page = page.trim_end_matches('/');
        Self::ALL.into_iter().find(|k| k.page() == page)
    }

    /// Localized path the context cookie is scoped to.
    pub fn scoped_path(self, locale: Locale) -> String {
        format!("/{}{}", locale, self.page())
    }
}

/// One-time verification context carried by `verify_context` / `reset_context`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneTimeContext {
    pub uid: String,
    pub token: String,
}

impl OneTimeContext {
    /// Both parts present and non-empty.
    pub fn from_parts(uid: Option<&str>, token: Option<&str>) -> Option<Self> {
        match (uid.map(str::trim), token.map(str::trim)) {
            (Some(uid), Some(token)) if !uid.is_empty() && !token.is_empty() => {
                Some(Self { uid: uid.to_string(), token: token.to_string() })
            },
            _ => None,
        }
    }

    /// Cookie-safe encoding: percent-encoded JSON.
    pub fn encode(&self) -> ApiResult<String> {
        let json = serde_json::to_string(self)?;
        Ok(urlencoding::encode(&json).into_owned())
    }

    pub fn decode(value: &str) -> ApiResult<Self> {
        let json = urlencoding::decode(value)
            .map_err(|e| ApiError::invalid_session(format!("undecodable context: {}", e)))?;
        serde_json::from_str::<Self>(&json)
            .map_err(|e| ApiError::invalid_session(format!("unparseable context: {}", e)))
            .and_then(|ctx| {
                Self::from_parts(Some(&ctx.uid), Some(&ctx.token))
                    .ok_or_else(|| ApiError::invalid_session("empty context"))
            })
    }
}

fn base_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value)).path("/").secure(secure).same_site(SameSite::Lax).build()
}

pub fn access_token_cookie(token: &str, secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(ACCESS_TOKEN_COOKIE, token.to_string(), secure);
    cookie.set_http_only(true);
    cookie.set_max_age(ACCESS_TOKEN_MAX_AGE);
    cookie
}

pub fn refresh_token_cookie(token: &str, secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(REFRESH_TOKEN_COOKIE, token.to_string(), secure);
    cookie.set_http_only(true);
    cookie.set_max_age(REFRESH_TOKEN_MAX_AGE);
    cookie
}

/// Readable by client scripts for display purposes.
pub fn username_cookie(username: &str, secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(USERNAME_COOKIE, username.to_string(), secure);
    cookie.set_http_only(false);
    cookie.set_max_age(ACCESS_TOKEN_MAX_AGE);
    cookie
}

/// Unsigned context cookie; the signed jar adds the MAC when it is stored.
pub fn context_cookie(
    kind: ContextKind,
    path: &str,
    encoded: String,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((kind.cookie_name(), encoded))
        .path(path.to_string())
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(CONTEXT_MAX_AGE)
        .build()
}

fn removal_cookie(name: &'static str, path: String, http_only: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path(path)
        .http_only(http_only)
        .max_age(Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Expire the context cookie on every localized path it may have been scoped to.
pub fn context_removals(kind: ContextKind) -> Vec<Cookie<'static>> {
    Locale::ALL
        .into_iter()
        .map(|locale| removal_cookie(kind.cookie_name(), kind.scoped_path(locale), true))
        .collect()
}

/// Every cookie the gateway may have set for a session, expired.
pub fn logout_removals() -> Vec<Cookie<'static>> {
    let mut cookies = vec![
        removal_cookie(ACCESS_TOKEN_COOKIE, "/".to_string(), true),
        removal_cookie(REFRESH_TOKEN_COOKIE, "/".to_string(), true),
        removal_cookie(USERNAME_COOKIE, "/".to_string(), false),
    ];
    for kind in ContextKind::ALL {
        cookies.extend(context_removals(kind));
    }
    cookies
}

/// Render cookies as individual `Set-Cookie` headers.
///
/// Jars key their delta by name, so cookies sharing a name with different
/// paths have to be emitted this way.
pub fn set_cookie_headers(cookies: &[Cookie<'static>]) -> Vec<(HeaderName, String)> {
    cookies.iter().map(|c| (SET_COOKIE, c.to_string())).collect()
}
