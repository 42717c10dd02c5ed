use std::time::Duration;

use reqwest::{Client, Response};

use crate::utils::{ApiError, ApiResult};

/// Fetches uploaded media from the backend host, trying each URL
/// convention in turn.
pub struct MediaService {
    http_client: Client,
    host: Option<String>,
}

impl MediaService {
    pub fn new(host: Option<String>, timeout_secs: u64) -> ApiResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiError::internal_error(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http_client, host })
    }

    /// First successful response among the candidate URLs. The body is left
    /// unread so callers can stream it. The session token only travels to
    /// `https://` candidates.
    pub async fn fetch(&self, path: &str, token: Option<&str>) -> ApiResult<Response> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| ApiError::internal_error("media host is not configured"))?;

        let path = sanitize_media_path(path).ok_or_else(|| ApiError::MediaNotFound(path.to_string()))?;

        for url in candidate_urls(host, &path) {
            let mut request = self.http_client.get(&url);
            if let Some(token) = token.filter(|_| url.starts_with("https://")) {
                request = request.bearer_auth(token);
            }
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!("Media {} served from {}", path, url);
                    return Ok(response);
                },
                Ok(response) => {
                    tracing::debug!("Media candidate {} returned {}", url, response.status())
                },
                Err(e) => tracing::debug!("Media candidate {} failed: {}", url, e),
            }
        }

        tracing::warn!("No media candidate succeeded for {}", path);
        Err(ApiError::MediaNotFound(path))
    }
}

/// Strip leading slashes and refuse traversal segments.
pub fn sanitize_media_path(path: &str) -> Option<String> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.split('/').any(|seg| seg == ".." || seg == ".") {
        return None;
    }
    Some(trimmed.to_string())
}

/// HTTPS before HTTP; `/media/`-prefixed before the bare path.
pub fn candidate_urls(host: &str, path: &str) -> Vec<String> {
    let relative = path.strip_prefix("media/").unwrap_or(path);
    let mut urls = Vec::with_capacity(4);
    for prefixed in [format!("media/{}", relative), relative.to_string()] {
        for scheme in ["https", "http"] {
            let url = format!("{}://{}/{}", scheme, host, prefixed);
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
    }
    urls
}
