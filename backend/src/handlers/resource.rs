use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::Value;

use crate::AppState;
use crate::models::Resource;
use crate::services::backend_client::{ProxyBody, ProxyResponse, access_token};
use crate::utils::ApiResult;

/// Backend success response as a local response. Bodyless answers keep
/// only their status.
pub fn relay(response: ProxyResponse) -> Response {
    if response.status == StatusCode::NO_CONTENT || response.body.is_null() {
        return response.status.into_response();
    }
    (response.status, Json(response.body)).into_response()
}

pub fn request_body(headers: &HeaderMap, body: Bytes) -> ProxyBody {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    ProxyBody::from_request(content_type, body)
}

/// `GET/POST /api/{resource}` and `GET/PATCH/DELETE /api/{resource}/:id`
/// for every mirrored collection.
pub fn routes() -> Router<Arc<AppState>> {
    Resource::ALL.into_iter().fold(Router::new(), |router, resource| {
        let collection = format!("/api{}", resource.local_path());
        let item = format!("{}/:id", collection);

        router
            .route(
                &collection,
                get(move |State(state): State<Arc<AppState>>, jar: CookieJar, RawQuery(query): RawQuery| async move {
                    list(&state, resource, &jar, query.as_deref()).await
                })
                .post(
                    move |State(state): State<Arc<AppState>>, jar: CookieJar, headers: HeaderMap, body: Bytes| async move {
                        create(&state, resource, &jar, &headers, body).await
                    },
                ),
            )
            .route(
                &item,
                get(move |State(state): State<Arc<AppState>>, jar: CookieJar, Path(id): Path<String>| async move {
                    retrieve(&state, resource, &jar, &id).await
                })
                .patch(
                    move |State(state): State<Arc<AppState>>,
                          jar: CookieJar,
                          Path(id): Path<String>,
                          headers: HeaderMap,
                          body: Bytes| async move {
                        update(&state, resource, &jar, &id, &headers, body).await
                    },
                )
                .delete(move |State(state): State<Arc<AppState>>, jar: CookieJar, Path(id): Path<String>| async move {
                    delete(&state, resource, &jar, &id).await
                }),
            )
    })
}

async fn list(
    state: &AppState,
    resource: Resource,
    jar: &CookieJar,
    query: Option<&str>,
) -> ApiResult<Json<Value>> {
    tracing::debug!("Listing {:?} (query: {:?})", resource, query);
    let token = access_token(jar);
    let body = state.proxy_service.list(resource, query, token.as_deref()).await?;
    Ok(Json(body))
}

async fn retrieve(
    state: &AppState,
    resource: Resource,
    jar: &CookieJar,
    id: &str,
) -> ApiResult<Response> {
    tracing::debug!("Fetching {:?} id={}", resource, id);
    let token = access_token(jar);
    let response = state.proxy_service.retrieve(resource, id, token.as_deref()).await?;
    Ok(relay(response))
}

async fn create(
    state: &AppState,
    resource: Resource,
    jar: &CookieJar,
    headers: &HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let body = request_body(headers, body);
    let token = access_token(jar);
    let response = state.proxy_service.create(resource, body, token.as_deref()).await?;
    Ok(relay(response))
}

async fn update(
    state: &AppState,
    resource: Resource,
    jar: &CookieJar,
    id: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let body = request_body(headers, body);
    let token = access_token(jar);
    let response = state.proxy_service.update(resource, id, body, token.as_deref()).await?;
    Ok(relay(response))
}

async fn delete(
    state: &AppState,
    resource: Resource,
    jar: &CookieJar,
    id: &str,
) -> ApiResult<Response> {
    let token = access_token(jar);
    let response = state.proxy_service.delete(resource, id, token.as_deref()).await?;
    Ok(relay(response))
}
