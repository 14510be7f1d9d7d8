use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether the REST backend answered its own health probe.
    pub backend_reachable: bool,
    /// Whether credentials are currently installed.
    pub signed_in: bool,
}

impl HealthResponse {
    /// Create a health response indicating the backend is reachable.
    pub fn ok(signed_in: bool) -> Self {
        Self {
            status: "ok".to_string(),
            backend_reachable: true,
            signed_in,
        }
    }

    /// Create a health response indicating the backend could not be reached.
    pub fn degraded(signed_in: bool) -> Self {
        Self {
            status: "degraded".to_string(),
            backend_reachable: false,
            signed_in,
        }
    }
}
