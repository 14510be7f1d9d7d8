use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod docs;
pub mod health;
pub mod rankings;
pub mod rooms;
pub mod scoreboard;
pub mod session;
pub mod teams;

/// Every local route plus the Swagger UI, bound to `state`.
pub fn router(state: SharedState) -> Router<()> {
    Router::new()
        .merge(health::router())
        .merge(session::router())
        .merge(rooms::router())
        .merge(teams::router())
        .merge(scoreboard::router())
        .merge(rankings::router())
        .merge(admin::router())
        .merge(docs::router())
        .with_state(state)
}
