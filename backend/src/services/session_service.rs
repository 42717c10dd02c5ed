use std::sync::Arc;

use reqwest::Method;
use serde_json::{Value, json};

use crate::models::{LoginRequest, SessionEvent, SessionState, TokenPair};
use crate::services::backend_client::{BackendClient, ProxyBody, ProxyResponse};
use crate::utils::{ApiError, ApiResult, OneTimeContext};

const TOKEN_CREATE_PATH: &str = "/auth/jwt/create/";
const TOKEN_VERIFY_PATH: &str = "/auth/jwt/verify/";
const ME_PATH: &str = "/auth/users/me/";
const USERS_PATH: &str = "/auth/users/";
const RESEND_ACTIVATION_PATH: &str = "/auth/users/resend_activation/";
const RESET_PASSWORD_PATH: &str = "/auth/users/reset_password/";
const RESET_PASSWORD_CONFIRM_PATH: &str = "/auth/users/reset_password_confirm/";

/// Credential exchange and session queries against the backend auth API.
pub struct SessionService {
    backend: Arc<BackendClient>,
}

impl SessionService {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    /// Exchange credentials for a token pair. No retry on rejection.
    pub async fn login(&self, req: &LoginRequest) -> ApiResult<TokenPair> {
        let state = SessionState::Anonymous.transition(SessionEvent::CredentialsSubmitted);
        tracing::debug!("Session {:?} for user {}", state, req.username);

        let result = self
            .backend
            .post_json(
                TOKEN_CREATE_PATH,
                json!({ "username": req.username, "password": req.password }),
                None,
            )
            .await
            .and_then(|response| {
                serde_json::from_value::<TokenPair>(response.body).map_err(|e| {
                    ApiError::internal_error(format!("Unexpected token response: {}", e))
                })
            });

        match &result {
            Ok(_) => {
                let state = state.transition(SessionEvent::BackendAccepted);
                tracing::info!("User {} logged in ({:?})", req.username, state);
            },
            Err(err) => {
                let state = state.transition(SessionEvent::BackendRejected);
                tracing::info!("Login rejected for user {} ({:?}): {}", req.username, state, err);
            },
        }
        result
    }

    /// Classify the caller's session. Never refreshes.
    pub async fn check(&self, token: Option<&str>) -> SessionState {
        let Some(token) = token else {
            return SessionState::Anonymous;
        };

        let event = match self.backend.post_json(TOKEN_VERIFY_PATH, json!({ "token": token }), None).await
        {
            Ok(_) => SessionEvent::TokenVerified,
            Err(err) => {
                tracing::debug!("Access token rejected: {}", err);
                SessionEvent::TokenRejected
            },
        };
        SessionState::Authenticated.transition(event)
    }

    pub async fn profile(&self, token: &str) -> ApiResult<ProxyResponse> {
        self.backend.send(Method::GET, ME_PATH, None, ProxyBody::Empty, Some(token)).await
    }

    pub async fn update_profile(&self, token: &str, body: ProxyBody) -> ApiResult<ProxyResponse> {
        self.backend.send(Method::PATCH, ME_PATH, None, body, Some(token)).await
    }

    pub async fn signup(&self, body: Value) -> ApiResult<ProxyResponse> {
        self.backend.post_json(USERS_PATH, body, None).await
    }

    pub async fn resend_activation(&self, email: &str) -> ApiResult<()> {
        self.backend.post_json(RESEND_ACTIVATION_PATH, json!({ "email": email }), None).await?;
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str) -> ApiResult<()> {
        self.backend.post_json(RESET_PASSWORD_PATH, json!({ "email": email }), None).await?;
        Ok(())
    }

    pub async fn confirm_password_reset(
        &self,
        context: &OneTimeContext,
        new_password: &str,
        re_new_password: &str,
    ) -> ApiResult<()> {
        self.backend
            .post_json(
                RESET_PASSWORD_CONFIRM_PATH,
                json!({
                    "uid": context.uid,
                    "token": context.token,
                    "new_password": new_password,
                    "re_new_password": re_new_password,
                }),
                None,
            )
            .await?;
        tracing::info!("Password reset confirmed");
        Ok(())
    }
}
