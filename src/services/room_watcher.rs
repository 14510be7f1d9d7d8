//! Background polling of rooms. Each watched room gets a task that re-reads it on a fixed
//! interval and publishes the latest copy through a `watch` channel.

use std::{
    sync::{Arc, Weak},
    time::SystemTime,
};

use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::{
    api::models::{RoomDto, RoomId},
    dto::{common::ActionResponse, rooms::WatchView},
    error::ServiceError,
    state::{AppState, RoomSnapshot, RoomWatcher, SharedState, teams::Entrant},
};

/// Start polling a room. Watching an already watched room returns its latest snapshot.
pub async fn start_watching(state: &SharedState, room_id: RoomId) -> Result<WatchView, ServiceError> {
    state.current_user().await?;

    let watcher = state
        .watchers()
        .entry(room_id.clone())
        .or_insert_with(|| spawn_watcher(state, room_id.clone()));
    Ok(WatchView::from_snapshot(watcher.latest()))
}

/// Latest snapshot of a watched room.
pub async fn latest(state: &SharedState, room_id: RoomId) -> Result<WatchView, ServiceError> {
    state.current_user().await?;
    Ok(state
        .watchers()
        .get(&room_id)
        .map(|watcher| WatchView::from_snapshot(watcher.latest()))
        .unwrap_or_else(WatchView::stopped))
}

pub async fn stop_watching(
    state: &SharedState,
    room_id: RoomId,
) -> Result<ActionResponse, ServiceError> {
    state.current_user().await?;
    match state.watchers().remove(&room_id) {
        Some(_) => {
            info!(room = %room_id, "stopped watching room");
            Ok(ActionResponse::new(format!("stopped watching room {room_id}")))
        }
        None => Err(ServiceError::NotFound(format!(
            "room {room_id} is not being watched"
        ))),
    }
}

fn spawn_watcher(state: &SharedState, room_id: RoomId) -> RoomWatcher {
    let (tx, rx) = watch::channel(None);
    let task = tokio::spawn(poll_room(Arc::downgrade(state), room_id.clone(), tx));
    info!(room = %room_id, "watching room");
    RoomWatcher::new(rx, task)
}

/// Poll until the state goes away or the watcher handle is dropped. Failed polls are logged and
/// the loop carries on.
async fn poll_room(
    state: Weak<AppState>,
    room_id: RoomId,
    tx: watch::Sender<Option<RoomSnapshot>>,
) {
    let period = match state.upgrade() {
        Some(state) => state.config().poll_interval(),
        None => return,
    };
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut generation = 0u64;

    loop {
        ticker.tick().await;
        let Some(state) = state.upgrade() else {
            break;
        };

        match state.backend().fetch_room(room_id.clone()).await {
            Ok(room) => {
                generation += 1;
                sync_panel(&state, &room);
                sync_participants(&state, &room);
                tx.send_replace(Some(RoomSnapshot {
                    room,
                    fetched_at: SystemTime::now(),
                    generation,
                }));
            }
            Err(err) => {
                warn!(room = %room_id, error = %err, "room poll failed");
            }
        }
    }
    debug!(room = %room_id, "room watcher finished");
}

/// Keep an open team panel in line with the roster the backend reports.
fn sync_panel(state: &AppState, room: &RoomDto) {
    if let Some(mut panel) = state.panels().get_mut(&room.id) {
        let roster = room.entrants.iter().cloned().map(Entrant::from);
        if panel.sync_roster(roster) {
            debug!(room = %room.id, "team panel roster updated");
        }
    }
}

/// Let newly joined players answer a pending result, and stop those who left.
fn sync_participants(state: &AppState, room: &RoomDto) {
    if let Some(mut machine) = state.confirmations().get_mut(&room.id) {
        machine.set_participants(room.entrant_ids());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        api::fake::{FakeBackend, room},
        config::AppConfig,
        services::team_service,
        state::test_support::signed_in_with,
    };

    async fn wait_for_generation(state: &SharedState, room_id: &RoomId, generation: u64) -> WatchView {
        for _ in 0..100 {
            let view = latest(state, room_id.clone()).await.unwrap();
            if view.generation >= generation {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("watcher never reached generation {generation}");
    }

    #[tokio::test]
    async fn watcher_publishes_and_syncs_panel() {
        let backend = Arc::new(FakeBackend::with_room(room(
            "r1",
            "ana",
            &[("ana", None), ("beto", None), ("caro", None)],
        )));
        let config = AppConfig::default().with_poll_interval(Duration::from_millis(20));
        let state = signed_in_with(backend.clone(), "ana", config).await;
        let room_id = RoomId::new("r1");

        team_service::open_panel(&state, room_id.clone()).await.unwrap();
        start_watching(&state, room_id.clone()).await.unwrap();
        let first = wait_for_generation(&state, &room_id, 1).await;
        assert_eq!(first.room.unwrap().entrants.len(), 3);

        backend.insert_room(room(
            "r1",
            "ana",
            &[("ana", None), ("beto", None), ("dani", None), ("eli", None)],
        ));
        let view = wait_for_generation(&state, &room_id, first.generation + 1).await;
        assert_eq!(view.room.unwrap().entrants.len(), 4);

        let panel = team_service::get_panel(&state, room_id.clone()).await.unwrap();
        let names: Vec<&str> = panel
            .unassigned
            .iter()
            .map(|entrant| entrant.id.as_str())
            .collect();
        assert_eq!(names, vec!["ana", "beto", "dani", "eli"]);

        stop_watching(&state, room_id.clone()).await.unwrap();
        assert!(!latest(&state, room_id).await.unwrap().watching);
    }

    #[tokio::test]
    async fn poll_errors_do_not_stop_the_watcher() {
        let backend = Arc::new(FakeBackend::with_room(room("r1", "ana", &[])));
        let config = AppConfig::default().with_poll_interval(Duration::from_millis(20));
        let state = signed_in_with(backend.clone(), "ana", config).await;
        let room_id = RoomId::new("r1");

        backend.fail_next(crate::api::fake::status_error(500));
        start_watching(&state, room_id.clone()).await.unwrap();

        let view = wait_for_generation(&state, &room_id, 1).await;
        assert!(view.watching);
        assert!(backend.calls_to("fetch_room") >= 2);
    }

    #[tokio::test]
    async fn sign_out_stops_watchers() {
        let backend = Arc::new(FakeBackend::with_room(room("r1", "ana", &[])));
        let config = AppConfig::default().with_poll_interval(Duration::from_millis(20));
        let state = signed_in_with(backend, "ana", config).await;

        start_watching(&state, RoomId::new("r1")).await.unwrap();
        state.sign_out().await;

        assert!(state.watchers().is_empty());
    }
}
