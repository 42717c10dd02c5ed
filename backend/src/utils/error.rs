use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_i18n::t;
use serde::Serialize;
use thiserror::Error;

use super::i18n::get_locale;

/// API Error with rich context and automatic error trait implementations
///
/// Each variant carries enough context to rebuild the client-facing message
/// in the request locale. Upstream messages are relayed verbatim.
#[derive(Error, Debug)]
pub enum ApiError {
    // Authentication / session errors 1xxx
    #[error("No access token")]
    Unauthenticated,

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Session expired")]
    SessionExpired,

    // Backend errors 2xxx
    #[error("Backend request failed ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Backend unreachable: {0}")]
    BackendUnreachable(String),

    #[error("Backend request timed out")]
    BackendTimeout,

    #[error("Verification timed out after {attempts} attempts")]
    VerificationTimeout { attempts: u32 },

    #[error("Verification failed after {attempts} attempts: {reason}")]
    VerificationUnavailable { attempts: u32, reason: String },

    // Resource errors 3xxx
    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Media not found: {0}")]
    MediaNotFound(String),

    // Validation errors 4xxx
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    // System errors 5xxx
    #[error("Internal error: {0}")]
    InternalError(String),

    // Generic wrapper for other errors - auto-convert from anyhow::Error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// Helper to create an upstream error from a backend status and message
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream { status, message: message.into() }
    }

    /// Helper to create invalid session error
    pub fn invalid_session(message: impl Into<String>) -> Self {
        Self::InvalidSession(message.into())
    }

    /// Helper to create internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    /// Helper to create validation error
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Transport-level failures worth retrying. HTTP responses never are.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::BackendUnreachable(_) | Self::BackendTimeout)
    }

    pub fn error_code(&self) -> i32 {
        match self {
            // Authentication / session errors 1xxx
            Self::Unauthenticated => 1001,
            Self::InvalidSession(_) => 1002,
            Self::SessionExpired => 1003,

            // Backend errors 2xxx
            Self::Upstream { .. } => 2001,
            Self::BackendUnreachable(_) => 2002,
            Self::BackendTimeout => 2003,
            Self::VerificationTimeout { .. } => 2004,
            Self::VerificationUnavailable { .. } => 2005,

            // Resource errors 3xxx
            Self::PageNotFound(_) => 3001,
            Self::MediaNotFound(_) => 3002,

            // Validation errors 4xxx
            Self::ValidationError(_) => 4001,
            Self::MalformedBody(_) => 4002,

            // System errors 5xxx
            Self::InternalError(_) => 5001,
            Self::Other(_) => 5001,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            },
            Self::BackendUnreachable(_) | Self::VerificationUnavailable { .. } => {
                StatusCode::BAD_GATEWAY
            },
            Self::BackendTimeout | Self::VerificationTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            other => match other.error_code() {
                1001..=1999 => StatusCode::UNAUTHORIZED,
                3000..=3999 => StatusCode::NOT_FOUND,
                4001..=4999 => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub code: i32,
    pub message: String,
}

impl ApiError {
    /// Get localized error message based on current locale
    pub fn localized_message(&self) -> String {
        let locale = get_locale();
        let locale = locale.as_str();
        match self {
            Self::Unauthenticated => t!("auth.no_access_token", locale = locale).to_string(),
            Self::InvalidSession(_) => t!("auth.invalid_session", locale = locale).to_string(),
            Self::SessionExpired => t!("auth.session_expired", locale = locale).to_string(),
            // Relayed as the backend phrased it
            Self::Upstream { message, .. } => message.clone(),
            Self::BackendUnreachable(_) => t!("backend.unreachable", locale = locale).to_string(),
            Self::BackendTimeout => t!("backend.timeout", locale = locale).to_string(),
            Self::VerificationTimeout { .. } => {
                t!("verification.timeout", locale = locale).to_string()
            },
            Self::VerificationUnavailable { .. } => {
                t!("verification.failed", locale = locale).to_string()
            },
            Self::PageNotFound(path) => t!("page.not_found", locale = locale, path = path).to_string(),
            Self::MediaNotFound(_) => t!("media.not_found", locale = locale).to_string(),
            Self::ValidationError(details) => {
                t!("validation.failed", locale = locale, details = details).to_string()
            },
            Self::MalformedBody(_) => t!("validation.malformed_body", locale = locale).to_string(),
            Self::InternalError(_) | Self::Other(_) => {
                t!("internal.error", locale = locale).to_string()
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let response =
            ApiErrorResponse { success: false, code: self.error_code(), message: self.localized_message() };

        (status, Json(response)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::internal_error(format!("JSON serialization error: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let details = err
            .field_errors()
            .into_iter()
            .map(|(field, _)| field.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        ApiError::validation_error(details)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::BackendTimeout
        } else {
            ApiError::BackendUnreachable(err.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
