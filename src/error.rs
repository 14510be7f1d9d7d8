use std::{io, path::PathBuf};

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{
    api::error::{ApiError, ErrorCategory},
    state::{
        AbortError, ApplyError, PlanError,
        confirmation::RejectedTransition,
        scoreboard::ScoreError,
        teams::TeamError,
    },
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The REST backend rejected the call or could not be reached.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Invalid input provided by the client.
    #[error("{0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("{0}")]
    InvalidState(String),
    /// The signed-in user is not allowed to perform the operation.
    #[error("{0}")]
    Forbidden(String),
    /// No user is signed in.
    #[error("{0}")]
    Unauthorized(String),
    /// Requested resource was not found.
    #[error("{0}")]
    NotFound(String),
    /// Operation exceeded its timeout limit.
    #[error("operation timed out")]
    Timeout,
    /// Writing an export file failed.
    #[error("failed to write export file `{}`", .path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ServiceError {
    /// User-facing category of this failure.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ServiceError::Api(err) => err.category(),
            ServiceError::InvalidInput(_) => ErrorCategory::Validation,
            ServiceError::InvalidState(_) => ErrorCategory::Conflict,
            ServiceError::Forbidden(_) => ErrorCategory::Authorization,
            ServiceError::Unauthorized(_) => ErrorCategory::Authentication,
            ServiceError::NotFound(_) => ErrorCategory::NotFound,
            ServiceError::Timeout => ErrorCategory::Network,
            ServiceError::Export { .. } => ErrorCategory::Server,
        }
    }
}

impl From<TeamError> for ServiceError {
    fn from(err: TeamError) -> Self {
        match err {
            TeamError::UnknownEntrant(_) => ServiceError::NotFound(err.to_string()),
            other => ServiceError::InvalidInput(other.to_string()),
        }
    }
}

impl From<ScoreError> for ServiceError {
    fn from(err: ScoreError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<RejectedTransition> for ServiceError {
    fn from(err: RejectedTransition) -> Self {
        match err {
            RejectedTransition::NotCreator
            | RejectedTransition::CreatorCannotRespond
            | RejectedTransition::NotParticipant => {
                ServiceError::Forbidden(err.to_string())
            }
            RejectedTransition::MissingReason => ServiceError::InvalidInput(err.to_string()),
            RejectedTransition::InvalidTransition { .. } => {
                ServiceError::InvalidState(err.to_string())
            }
        }
    }
}

impl From<PlanError> for ServiceError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::AlreadyPending => {
                ServiceError::InvalidState("state transition already pending".into())
            }
            PlanError::Rejected(rejected) => rejected.into(),
        }
    }
}

impl From<ApplyError> for ServiceError {
    fn from(err: ApplyError) -> Self {
        match err {
            ApplyError::NoPending => ServiceError::InvalidState("no transition is pending".into()),
            ApplyError::IdMismatch { .. } => {
                ServiceError::InvalidState("pending transition does not match".into())
            }
            ApplyError::StateMismatch { expected, actual } => ServiceError::InvalidState(format!(
                "state changed during transition (expected {expected:?}, got {actual:?})"
            )),
            ApplyError::VersionMismatch { expected, actual } => {
                ServiceError::InvalidState(format!(
                    "state version mismatch during transition (expected {expected}, got {actual})"
                ))
            }
        }
    }
}

impl From<AbortError> for ServiceError {
    fn from(err: AbortError) -> Self {
        match err {
            AbortError::NoPending => ServiceError::InvalidState("no pending transition".into()),
            AbortError::IdMismatch { .. } => {
                ServiceError::InvalidState("transition plan does not match".into())
            }
        }
    }
}

/// Normalized error returned by every route: message, category and status.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AppError {
    pub category: ErrorCategory,
    pub message: String,
    pub status: StatusCode,
}

impl AppError {
    /// Error with the default status of its category.
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            status: default_status(category),
        }
    }
}

fn default_status(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::Validation | ErrorCategory::Business => StatusCode::BAD_REQUEST,
        ErrorCategory::Authentication => StatusCode::UNAUTHORIZED,
        ErrorCategory::Authorization => StatusCode::FORBIDDEN,
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Conflict => StatusCode::CONFLICT,
        ErrorCategory::Server => StatusCode::BAD_GATEWAY,
        ErrorCategory::Network => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::new(
            ErrorCategory::Validation,
            format!("validation failed: {err}"),
        )
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let category = err.category();
        let status = match &err {
            ServiceError::Api(api) => api
                .status_code()
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or_else(|| default_status(category)),
            ServiceError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::Export { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => default_status(category),
        };

        Self {
            category,
            message: err.to_string(),
            status,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    pub category: ErrorCategory,
    pub status_code: u16,
    /// True for server and network failures.
    pub retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let payload = Json(ErrorBody {
            retryable: self.category.is_retryable(),
            status_code: self.status.as_u16(),
            category: self.category,
            message: self.message,
        });

        (self.status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rejection_keeps_backend_status_and_message() {
        let err = ServiceError::Api(ApiError::Status {
            path: "rooms/1/result".into(),
            status: StatusCode::BAD_REQUEST,
            message: "Ya existe un partido igual esta semana".into(),
            error_type: Some("business".into()),
        });

        let app: AppError = err.into();
        assert_eq!(app.category, ErrorCategory::Business);
        assert_eq!(app.status, StatusCode::BAD_REQUEST);
        assert_eq!(app.message, "Ya existe un partido igual esta semana");
    }

    #[test]
    fn local_rejections_map_to_categories() {
        let team: AppError = ServiceError::from(TeamError::Incomplete).into();
        assert_eq!(team.category, ErrorCategory::Validation);
        assert_eq!(team.message, "Ambos equipos deben tener 2 jugadores");

        let role: AppError = ServiceError::from(RejectedTransition::NotCreator).into();
        assert_eq!(role.category, ErrorCategory::Authorization);
        assert_eq!(role.status, StatusCode::FORBIDDEN);

        let timeout: AppError = ServiceError::Timeout.into();
        assert_eq!(timeout.category, ErrorCategory::Network);
        assert!(timeout.category.is_retryable());
    }
}
