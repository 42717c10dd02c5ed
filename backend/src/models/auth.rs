use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::OneTimeContext;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Token pair issued by `POST /auth/jwt/create/`
#[derive(Debug, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }
}

/// Observable session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated,
    SessionExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    CredentialsSubmitted,
    BackendAccepted,
    BackendRejected,
    TokenVerified,
    TokenRejected,
    LoggedOut,
}

impl SessionState {
    /// Apply `event`; events that make no sense in the current state leave it unchanged.
    pub fn transition(self, event: SessionEvent) -> Self {
        use SessionEvent::*;
        use SessionState::*;

        match (self, event) {
            (_, LoggedOut) => Anonymous,
            (Anonymous | SessionExpired, CredentialsSubmitted) => Authenticating,
            (Authenticating, BackendAccepted) => Authenticated,
            (Authenticating, BackendRejected) => Anonymous,
            (Authenticated | SessionExpired, TokenVerified) => Authenticated,
            (Authenticated, TokenRejected) => SessionExpired,
            (state, _) => state,
        }
    }

    pub fn is_authenticated(self) -> bool {
        self == Self::Authenticated
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Body of the email-verification confirmation. Both fields fall back to
/// the `verify_context` cookie when absent.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct VerifyEmailRequest {
    pub uid: Option<String>,
    pub token: Option<String>,
}

impl VerifyEmailRequest {
    pub fn context(&self) -> Option<OneTimeContext> {
        OneTimeContext::from_parts(self.uid.as_deref(), self.token.as_deref())
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EmailRequest {
    #[validate(length(min = 1))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetConfirmRequest {
    #[validate(length(min = 1))]
    pub new_password: String,
    #[validate(length(min = 1))]
    pub re_new_password: String,
    pub uid: Option<String>,
    pub token: Option<String>,
}

impl ResetConfirmRequest {
    pub fn context(&self) -> Option<OneTimeContext> {
        OneTimeContext::from_parts(self.uid.as_deref(), self.token.as_deref())
    }
}
