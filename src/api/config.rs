use std::time::Duration;

use super::error::{ApiError, ApiResult};

/// Fallback per-request timeout when none is configured.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime configuration describing how to reach the REST backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl ApiConfig {
    /// Construct a configuration from an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> ApiResult<Self> {
        let base_url = std::env::var("PADEL_API_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or(ApiError::MissingEnvVar {
                var: "PADEL_API_URL",
            })?;

        Ok(Self::new(base_url))
    }
}
