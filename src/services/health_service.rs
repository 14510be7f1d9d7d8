use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the REST backend and report whether it answered.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let signed_in = state.tokens().is_signed_in();
    match state.backend().health_check().await {
        Ok(()) => HealthResponse::ok(signed_in),
        Err(err) => {
            warn!(error = %err, "backend health check failed");
            HealthResponse::degraded(signed_in)
        }
    }
}
