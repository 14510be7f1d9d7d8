use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::{
        common::ActionResponse,
        session::{SessionView, SignInRequest},
    },
    services::session_service,
    state::SharedState,
};

/// Session routes: sign-in, sign-out and the current identity.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/session",
        post(sign_in).get(current_session).delete(sign_out),
    )
}

/// Install the tokens issued by the login flow.
#[utoipa::path(
    post,
    path = "/session",
    tag = "session",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionView),
        (status = 400, description = "No usable token")
    )
)]
pub async fn sign_in(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SignInRequest>>,
) -> Json<SessionView> {
    Json(session_service::sign_in(&state, payload).await)
}

#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses((status = 200, description = "Current session", body = SessionView))
)]
pub async fn current_session(State(state): State<SharedState>) -> Json<SessionView> {
    Json(session_service::current(&state).await)
}

/// Forget tokens and all local room state.
#[utoipa::path(
    delete,
    path = "/session",
    tag = "session",
    responses((status = 200, description = "Signed out", body = ActionResponse))
)]
pub async fn sign_out(State(state): State<SharedState>) -> Json<ActionResponse> {
    Json(session_service::sign_out(&state).await)
}
