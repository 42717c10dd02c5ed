use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;

use crate::models::{AuthRequirement, Resource};
use crate::services::backend_client::{
    BackendClient, ProxyBody, ProxyResponse, bearer_for, matches_empty_list_signature,
};
use crate::services::list_cache::ListCache;
use crate::utils::{ApiError, ApiResult};

/// CRUD relay for the backend collections mirrored under `/api`.
pub struct ProxyService {
    backend: Arc<BackendClient>,
    cache: ListCache,
}

impl ProxyService {
    pub fn new(backend: Arc<BackendClient>, cache: ListCache) -> Self {
        Self { backend, cache }
    }

    pub async fn list(
        &self,
        resource: Resource,
        query: Option<&str>,
        token: Option<&str>,
    ) -> ApiResult<Value> {
        if let Some(cached) = self.cache.get(resource, query, token) {
            tracing::debug!("Serving cached {:?} list", resource);
            return Ok(cached);
        }

        let generation = self.cache.generation(resource);
        match self.fetch_list(resource, query, token).await {
            Ok(body) => {
                self.cache.put(resource, query, token, generation, body.clone());
                Ok(body)
            },
            Err(err)
                if resource.lists_fall_back_to_empty()
                    && matches_empty_list_signature(&err.to_string()) =>
            {
                tracing::debug!("{:?} list unavailable ({}), returning empty list", resource, err);
                Ok(Value::Array(Vec::new()))
            },
            Err(err) => Err(err),
        }
    }

    async fn fetch_list(
        &self,
        resource: Resource,
        query: Option<&str>,
        token: Option<&str>,
    ) -> ApiResult<Value> {
        let bearer = bearer_for(resource.read_auth(), token)?;
        let response = self
            .backend
            .send(Method::GET, resource.backend_path(), query, ProxyBody::Empty, bearer.as_deref())
            .await?;
        tracing::debug!("Fetched {:?} list from backend", resource);
        Ok(response.body)
    }

    pub async fn retrieve(
        &self,
        resource: Resource,
        id: &str,
        token: Option<&str>,
    ) -> ApiResult<ProxyResponse> {
        let bearer = bearer_for(resource.read_auth(), token)?;
        self.backend
            .send(Method::GET, &resource.item_path(id), None, ProxyBody::Empty, bearer.as_deref())
            .await
    }

    pub async fn create(
        &self,
        resource: Resource,
        body: ProxyBody,
        token: Option<&str>,
    ) -> ApiResult<ProxyResponse> {
        self.write(Method::POST, resource, resource.backend_path().to_string(), body, token).await
    }

    pub async fn update(
        &self,
        resource: Resource,
        id: &str,
        body: ProxyBody,
        token: Option<&str>,
    ) -> ApiResult<ProxyResponse> {
        self.write(Method::PATCH, resource, resource.item_path(id), body, token).await
    }

    pub async fn delete(
        &self,
        resource: Resource,
        id: &str,
        token: Option<&str>,
    ) -> ApiResult<ProxyResponse> {
        self.write(Method::DELETE, resource, resource.item_path(id), ProxyBody::Empty, token)
            .await
    }

    async fn write(
        &self,
        method: Method,
        resource: Resource,
        path: String,
        body: ProxyBody,
        token: Option<&str>,
    ) -> ApiResult<ProxyResponse> {
        let bearer = bearer_for(AuthRequirement::Required, token)?;
        // any write attempt invalidates, whatever the outcome; again once it
        // settles for lists fetched while it was in flight
        self.cache.invalidate(resource);
        let result = self.backend.send(method.clone(), &path, None, body, bearer.as_deref()).await;
        self.cache.invalidate(resource);
        match &result {
            Ok(response) => {
                tracing::info!("{} {:?} at {} -> {}", method, resource, path, response.status)
            },
            Err(ApiError::Upstream { status, .. }) => {
                tracing::warn!("{} {:?} at {} rejected with {}", method, resource, path, status)
            },
            Err(err) => tracing::warn!("{} {:?} at {} failed: {}", method, resource, path, err),
        }
        result
    }
}
