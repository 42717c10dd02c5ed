use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::AppState;
use crate::services::backend_client::access_token;
use crate::utils::ApiResult;

/// Stream an uploaded file from the media host
#[utoipa::path(
    get,
    path = "/api/media/{path}",
    params(
        ("path" = String, Path, description = "Media path, with or without the media/ prefix")
    ),
    responses(
        (status = 200, description = "File contents with the upstream content type"),
        (status = 404, description = "No candidate URL served the file")
    ),
    tag = "Media"
)]
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(path): Path<String>,
) -> ApiResult<Response> {
    let token = access_token(&jar);
    let upstream = state.media_service.fetch(&path, token.as_deref()).await?;

    let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
    let cache_control = upstream.headers().get(CACHE_CONTROL).cloned();

    let mut response = Body::from_stream(upstream.bytes_stream()).into_response();
    let headers = response.headers_mut();
    if let Some(content_type) = content_type {
        headers.insert(CONTENT_TYPE, content_type);
    }
    if let Some(cache_control) = cache_control {
        headers.insert(CACHE_CONTROL, cache_control);
    }
    Ok(response)
}
