//! Sign-in and sign-out of the local session.

use tracing::info;

use crate::{
    dto::{
        common::ActionResponse,
        session::{SessionView, SignInRequest},
    },
    state::SharedState,
};

/// Install the user's identity and tokens, discarding whatever the previous session held.
pub async fn sign_in(state: &SharedState, request: SignInRequest) -> SessionView {
    let (user, credentials) = request.into_parts();
    state.sign_in(user.clone(), credentials).await;
    user.into()
}

/// Forget tokens and every piece of session-scoped state.
pub async fn sign_out(state: &SharedState) -> ActionResponse {
    state.sign_out().await;
    info!("signed out");
    ActionResponse::new("signed out")
}

pub async fn current(state: &SharedState) -> SessionView {
    match state.session().await {
        Some(user) if state.tokens().is_signed_in() => user.into(),
        _ => SessionView::signed_out(),
    }
}
