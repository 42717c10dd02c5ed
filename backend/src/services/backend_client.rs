//! HTTP client for the learning platform backend.
//!
//! Every proxied call goes through [`BackendClient::send`]: bearer
//! credential attachment, verbatim body forwarding, and normalization of
//! non-2xx responses into a single [`ApiError::Upstream`].

use std::time::Duration;

use axum::body::Bytes;
use axum_extra::extract::cookie::CookieJar;
use reqwest::{Client, Method, StatusCode, header::CONTENT_TYPE};
use serde_json::Value;

use crate::config::BackendConfig;
use crate::models::AuthRequirement;
use crate::utils::cookies::ACCESS_TOKEN_COOKIE;
use crate::utils::{ApiError, ApiResult};

/// Longest raw (non-JSON) error body relayed to the caller.
pub const MAX_RAW_ERROR_LEN: usize = 200;

/// Error texts that list fetches treat as "nothing to show yet".
pub const EMPTY_LIST_SIGNATURES: [&str; 6] =
    ["404", "not found", "No access token", "does not exist", "401", "403"];

/// Outbound request body.
#[derive(Debug, Clone)]
pub enum ProxyBody {
    Empty,
    /// Built locally by the gateway (auth flows)
    Json(Value),
    /// Forwarded byte-for-byte with its original content type
    Raw { content_type: String, bytes: Bytes },
}

impl ProxyBody {
    /// Wrap an inbound body without inspecting it. JSON and multipart alike
    /// reach the backend exactly as the client sent them.
    pub fn from_request(content_type: Option<&str>, bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return Self::Empty;
        }
        let content_type = content_type.unwrap_or("application/octet-stream").to_string();
        Self::Raw { content_type, bytes }
    }
}

/// Successful backend response, JSON body passed through untouched.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub struct BackendClient {
    http_client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> ApiResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::internal_error(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http_client, base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: ProxyBody,
        token: Option<&str>,
    ) -> ApiResult<ProxyResponse> {
        let mut url = self.url(path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }

        tracing::debug!("Backend request: {} {}", method, url);

        let mut request = self.http_client.request(method.clone(), &url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request = match body {
            ProxyBody::Empty => request,
            ProxyBody::Json(value) => request.json(&value),
            ProxyBody::Raw { content_type, bytes } => {
                request.header(CONTENT_TYPE, content_type).body(bytes)
            },
        };

        let response = request.send().await.map_err(|e| {
            tracing::warn!("Backend request {} {} failed: {}", method, path, e);
            ApiError::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = extract_error_message(status, &text);
            tracing::debug!("Backend {} {} returned {}: {}", method, path, status, message);
            return Err(ApiError::upstream(status.as_u16(), message));
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(ProxyResponse { status, body })
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: Value,
        token: Option<&str>,
    ) -> ApiResult<ProxyResponse> {
        self.send(Method::POST, path, None, ProxyBody::Json(body), token).await
    }
}

/// Read the access-token cookie.
pub fn access_token(jar: &CookieJar) -> Option<String> {
    jar.get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Token to attach for a call with the given requirement.
///
/// A required call without a session fails here, before any network I/O.
pub fn bearer_for(
    requirement: AuthRequirement,
    token: Option<&str>,
) -> ApiResult<Option<String>> {
    match (requirement, token) {
        (_, Some(token)) => Ok(Some(token.to_string())),
        (AuthRequirement::Required, None) => Err(ApiError::Unauthenticated),
        (AuthRequirement::Optional, None) => Ok(None),
    }
}

/// Human-readable message from a backend error body.
///
/// Order: `detail`, `error`, per-field validation messages as
/// `"field: message"` pairs, then the raw body truncated to
/// [`MAX_RAW_ERROR_LEN`] characters.
pub fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body)
        && let Some(message) = message_from_json(&value)
    {
        return message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {}", status.as_u16());
    }
    trimmed.chars().take(MAX_RAW_ERROR_LEN).collect()
}

fn message_from_json(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            for key in ["detail", "error"] {
                if let Some(message) = map.get(key).and_then(flatten_messages) {
                    return Some(message);
                }
            }

            let pairs: Vec<String> = map
                .iter()
                .filter_map(|(field, v)| flatten_messages(v).map(|m| format!("{}: {}", field, m)))
                .collect();
            (!pairs.is_empty()).then(|| pairs.join("; "))
        },
        Value::Array(_) | Value::String(_) => flatten_messages(value),
        _ => None,
    }
}

fn flatten_messages(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(flatten_messages).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        },
        _ => None,
    }
}

/// Whether a list fetch error should be reported as an empty list.
pub fn matches_empty_list_signature(error_text: &str) -> bool {
    EMPTY_LIST_SIGNATURES.iter().any(|sig| error_text.contains(sig))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_wins() {
        let msg = extract_error_message(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Invalid token", "error": "other"}"#,
        );
        assert_eq!(msg, "Invalid token");
    }

    #[test]
    fn test_error_key() {
        let msg = extract_error_message(StatusCode::BAD_REQUEST, r#"{"error": "Bad upload"}"#);
        assert_eq!(msg, "Bad upload");
    }

    #[test]
    fn test_field_errors_joined() {
        let msg = extract_error_message(
            StatusCode::BAD_REQUEST,
            r#"{"email": ["Enter a valid email address."], "password": ["Too short.", "Too common."]}"#,
        );
        assert_eq!(
            msg,
            "email: Enter a valid email address.; password: Too short., Too common."
        );
    }

    #[test]
    fn test_raw_body_truncated() {
        let body = "x".repeat(500);
        let msg = extract_error_message(StatusCode::BAD_GATEWAY, &body);
        assert_eq!(msg.chars().count(), MAX_RAW_ERROR_LEN);

        let html = "<html><body>Server Error (500)</body></html>";
        assert_eq!(extract_error_message(StatusCode::INTERNAL_SERVER_ERROR, html), html);
    }

    #[test]
    fn test_empty_body_names_status() {
        assert_eq!(extract_error_message(StatusCode::NOT_FOUND, ""), "HTTP 404");
    }

    #[test]
    fn test_json_without_messages_falls_back_to_raw() {
        assert_eq!(extract_error_message(StatusCode::BAD_REQUEST, r#"{"count": 3}"#), r#"{"count": 3}"#);
    }

    #[test]
    fn test_empty_list_signatures() {
        assert!(matches_empty_list_signature("Backend request failed (404): Not found."));
        assert!(matches_empty_list_signature("No access token"));
        assert!(matches_empty_list_signature("Lesson matching query does not exist."));
        assert!(matches_empty_list_signature("Backend request failed (403): nope"));
        assert!(!matches_empty_list_signature("Backend request failed (500): boom"));
    }

    #[test]
    fn test_bearer_requirement() {
        assert!(matches!(bearer_for(AuthRequirement::Required, None), Err(ApiError::Unauthenticated)));
        assert_eq!(bearer_for(AuthRequirement::Optional, None).unwrap(), None);
        assert_eq!(
            bearer_for(AuthRequirement::Optional, Some("X")).unwrap().as_deref(),
            Some("X")
        );
    }

    #[test]
    fn test_inbound_bodies_are_kept_raw() {
        let raw = br#"{"name":"x","budget":12345678901234567890123,"b":1,"a":2}"#;
        match ProxyBody::from_request(Some("application/json"), Bytes::from_static(raw)) {
            ProxyBody::Raw { content_type, bytes } => {
                assert_eq!(content_type, "application/json");
                assert_eq!(&bytes[..], &raw[..]);
            },
            other => panic!("unexpected body: {:?}", other),
        }

        let multipart = ProxyBody::from_request(
            Some("multipart/form-data; boundary=xyz"),
            Bytes::from_static(b"--xyz\r\n"),
        );
        match multipart {
            ProxyBody::Raw { content_type, bytes } => {
                assert_eq!(content_type, "multipart/form-data; boundary=xyz");
                assert_eq!(&bytes[..], b"--xyz\r\n");
            },
            other => panic!("unexpected body: {:?}", other),
        }

        assert!(matches!(ProxyBody::from_request(None, Bytes::new()), ProxyBody::Empty));
        // malformed JSON is the backend's call
        assert!(matches!(
            ProxyBody::from_request(Some("application/json"), Bytes::from_static(b"{")),
            ProxyBody::Raw { .. }
        ));
    }
}
