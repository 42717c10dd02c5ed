//! Email verification with bounded retries.
//!
//! Transport failures and per-attempt timeouts are retried with a linear
//! backoff; any HTTP response from the backend ends the loop.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::config::VerificationConfig;
use crate::services::backend_client::BackendClient;
use crate::utils::{ApiError, ApiResult, OneTimeContext};

const ACTIVATION_PATH: &str = "/auth/users/activation/";

pub struct VerificationService {
    backend: Arc<BackendClient>,
    max_attempts: u32,
    attempt_timeout: Duration,
    backoff: Duration,
}

impl VerificationService {
    pub fn new(backend: Arc<BackendClient>, config: &VerificationConfig) -> Self {
        Self {
            backend,
            max_attempts: config.max_attempts.max(1),
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    #[cfg(test)]
    pub fn with_timings(mut self, attempt_timeout: Duration, backoff: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self.backoff = backoff;
        self
    }

    pub async fn verify(&self, context: &OneTimeContext) -> ApiResult<()> {
        let body = json!({ "uid": context.uid, "token": context.token });
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            let outcome = tokio::time::timeout(
                self.attempt_timeout,
                self.backend.post_json(ACTIVATION_PATH, body.clone(), None),
            )
            .await
            .unwrap_or(Err(ApiError::BackendTimeout));

            match outcome {
                Ok(_) => {
                    tracing::info!("Email verified on attempt {}", attempt);
                    return Ok(());
                },
                Err(err) if err.is_transient() => {
                    tracing::warn!(
                        "Verification attempt {}/{} failed: {}",
                        attempt,
                        self.max_attempts,
                        err
                    );
                    last_error = Some(err);
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff * attempt).await;
                    }
                },
                Err(err) => return Err(err),
            }
        }

        let attempts = self.max_attempts;
        Err(match last_error {
            Some(ApiError::BackendTimeout) => ApiError::VerificationTimeout { attempts },
            Some(err) => ApiError::VerificationUnavailable { attempts, reason: err.to_string() },
            None => ApiError::VerificationUnavailable { attempts, reason: "no attempt made".into() },
        })
    }
}
