//! Error types shared by the REST backend client.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Convenient result alias returning [`ApiError`] failures.
pub type ApiResult<T> = Result<T, ApiError>;

/// `error_type` tags the backend uses to flag business-rule rejections on a 400.
const BUSINESS_ERROR_TYPES: &[&str] = &["business", "business_rule", "regla_negocio"];

/// User-facing error families derived from the HTTP status and the backend `error_type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or rejected input (400/422).
    Validation,
    /// Missing or expired credentials (401).
    Authentication,
    /// Authenticated but not allowed (403).
    Authorization,
    /// Resource does not exist (404).
    NotFound,
    /// Conflicting state on the backend (409).
    Conflict,
    /// Business rule rejected the request (400 with a business tag).
    Business,
    /// Backend failure (5xx) or unreadable response.
    Server,
    /// No response was received.
    Network,
}

impl ErrorCategory {
    /// Classify a backend status code, taking the optional `error_type` tag into account.
    pub fn from_status(status: StatusCode, error_type: Option<&str>) -> Self {
        match status.as_u16() {
            400 if error_type.is_some_and(is_business_tag) => ErrorCategory::Business,
            400 | 422 => ErrorCategory::Validation,
            401 => ErrorCategory::Authentication,
            403 => ErrorCategory::Authorization,
            404 => ErrorCategory::NotFound,
            409 => ErrorCategory::Conflict,
            500..=599 => ErrorCategory::Server,
            _ => ErrorCategory::Validation,
        }
    }

    /// Only server and network failures are worth retrying.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorCategory::Server | ErrorCategory::Network)
    }
}

fn is_business_tag(tag: &str) -> bool {
    BUSINESS_ERROR_TYPES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(tag.trim()))
}

/// Failures that can occur while talking to the REST backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Required environment variable is missing.
    #[error("missing backend environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build backend client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or no response came back.
    #[error("failed to reach backend at `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The backend did not answer in time.
    #[error("backend request to `{path}` timed out after {after:?}")]
    Timeout { path: String, after: Duration },
    /// The backend answered with a non-success status.
    #[error("{message}")]
    Status {
        path: String,
        status: StatusCode,
        message: String,
        error_type: Option<String>,
    },
    /// Response payload could not be decoded.
    #[error("failed to decode backend response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// No credentials are stored; the user has to sign in.
    #[error("no active session, please sign in")]
    NotSignedIn,
    /// Both stored tokens were rejected; the session was torn down.
    #[error("session expired, please sign in again")]
    SessionExpired,
}

impl ApiError {
    /// Category surfaced to the user for this failure.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::MissingEnvVar { .. }
            | ApiError::ClientBuilder { .. }
            | ApiError::DecodeResponse { .. } => ErrorCategory::Server,
            ApiError::RequestSend { .. } | ApiError::Timeout { .. } => ErrorCategory::Network,
            ApiError::Status {
                status, error_type, ..
            } => ErrorCategory::from_status(*status, error_type.as_deref()),
            ApiError::NotSignedIn | ApiError::SessionExpired => ErrorCategory::Authentication,
        }
    }

    /// HTTP status returned by the backend, when one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(status.as_u16()),
            ApiError::NotSignedIn | ApiError::SessionExpired => Some(401),
            _ => None,
        }
    }

    /// True when the backend reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    /// Whether the caller may offer a retry.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}
