pub mod confirmation;
pub mod scoreboard;
pub mod teams;
mod watchers;

use std::{future::Future, sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{
    api::{
        PadelBackend,
        auth::{Credentials, TokenStore},
        models::{EntrantId, RoomId},
    },
    config::AppConfig,
    error::ServiceError,
};

pub use self::confirmation::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};
pub use self::watchers::{RoomSnapshot, RoomWatcher};
use self::{
    confirmation::{ConfirmationEvent, ConfirmationMachine, ConfirmationState},
    scoreboard::Scoreboard,
    teams::TeamAssignment,
};

pub type SharedState = Arc<AppState>;

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub user_id: EntrantId,
    pub display_name: Option<String>,
}

/// Central application state: backend handle, session, and per-room local state.
///
/// Everything keyed by room only lives for the duration of a session; signing out (or the
/// backend rejecting every token) drops it.
pub struct AppState {
    backend: Arc<dyn PadelBackend>,
    tokens: Arc<TokenStore>,
    config: AppConfig,
    session: RwLock<Option<UserSession>>,
    panels: DashMap<RoomId, TeamAssignment>,
    scoreboards: DashMap<RoomId, Scoreboard>,
    confirmations: DashMap<RoomId, ConfirmationMachine>,
    watchers: DashMap<RoomId, RoomWatcher>,
    /// One gate per room; transitions of different rooms run concurrently.
    transition_gates: DashMap<RoomId, Arc<Mutex<()>>>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// `tokens` must be the store the backend client reads its credentials from.
    pub fn new(
        backend: Arc<dyn PadelBackend>,
        tokens: Arc<TokenStore>,
        config: AppConfig,
    ) -> SharedState {
        let transition_timeout = Some(config.transition_timeout());
        Arc::new(Self {
            backend,
            tokens,
            config,
            session: RwLock::new(None),
            panels: DashMap::new(),
            scoreboards: DashMap::new(),
            confirmations: DashMap::new(),
            watchers: DashMap::new(),
            transition_gates: DashMap::new(),
            transition_timeout,
        })
    }

    /// Handle to the REST backend.
    pub fn backend(&self) -> Arc<dyn PadelBackend> {
        Arc::clone(&self.backend)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Open team assignment panels keyed by room.
    pub fn panels(&self) -> &DashMap<RoomId, TeamAssignment> {
        &self.panels
    }

    /// Open scoreboards keyed by room.
    pub fn scoreboards(&self) -> &DashMap<RoomId, Scoreboard> {
        &self.scoreboards
    }

    /// Confirmation machines keyed by room.
    pub fn confirmations(&self) -> &DashMap<RoomId, ConfirmationMachine> {
        &self.confirmations
    }

    /// Running room watchers keyed by room.
    pub fn watchers(&self) -> &DashMap<RoomId, RoomWatcher> {
        &self.watchers
    }

    /// Install credentials and the user identity.
    pub async fn sign_in(&self, user: UserSession, credentials: Credentials) {
        self.teardown().await;
        self.tokens.install(credentials).await;
        info!(user_id = %user.user_id, "session started");
        let mut guard = self.session.write().await;
        *guard = Some(user);
    }

    /// Forget the tokens and every piece of session-scoped state.
    pub async fn sign_out(&self) {
        self.tokens.clear().await;
        self.teardown().await;
    }

    /// Drop the session identity and all per-room state, stopping every watcher.
    pub async fn teardown(&self) {
        let previous = self.session.write().await.take();
        self.watchers.clear();
        self.panels.clear();
        self.scoreboards.clear();
        self.confirmations.clear();
        self.transition_gates.clear();
        if let Some(user) = previous {
            info!(user_id = %user.user_id, "session torn down");
        }
    }

    /// Drop every piece of local state tied to one room.
    pub fn forget_room(&self, room: &RoomId) {
        self.watchers.remove(room);
        self.panels.remove(room);
        self.scoreboards.remove(room);
        self.confirmations.remove(room);
        self.transition_gates.remove(room);
    }

    /// Signed-in user, if any.
    pub async fn session(&self) -> Option<UserSession> {
        self.session.read().await.clone()
    }

    /// Signed-in user or an authentication error.
    pub async fn current_user(&self) -> Result<UserSession, ServiceError> {
        self.session()
            .await
            .ok_or_else(|| ServiceError::Unauthorized("no active session, please sign in".into()))
    }

    /// Tear the session down whenever the token store flips to signed out, e.g. after the
    /// backend rejected every stored token.
    pub fn spawn_session_janitor(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let state = Arc::downgrade(self);
        let mut signed_in = self.tokens.subscribe();
        tokio::spawn(async move {
            while signed_in.changed().await.is_ok() {
                if *signed_in.borrow_and_update() {
                    continue;
                }
                let Some(state) = state.upgrade() else {
                    break;
                };
                debug!("credentials cleared; tearing down session state");
                state.teardown().await;
            }
        })
    }

    fn plan_transition(&self, room: &RoomId, event: ConfirmationEvent) -> Result<Plan, ServiceError> {
        let mut machine = self.confirmations.get_mut(room).ok_or_else(|| {
            ServiceError::InvalidState(format!("no result is loaded for room {room}"))
        })?;
        Ok(machine.plan(event)?)
    }

    fn transition_gate(&self, room: &RoomId) -> Arc<Mutex<()>> {
        self.transition_gates
            .entry(room.clone())
            .or_default()
            .value()
            .clone()
    }

    /// Apply an acknowledged plan. The backend already accepted the action, so a room forgotten
    /// in the meantime still reports the planned state.
    fn apply_planned_transition(
        &self,
        room: &RoomId,
        plan: &Plan,
    ) -> Result<ConfirmationState, ServiceError> {
        match self.confirmations.get_mut(room) {
            Some(mut machine) => Ok(machine.apply(plan.id)?),
            None => {
                info!(
                    room = %room,
                    plan_id = %plan.id,
                    state = ?plan.to,
                    "backend acknowledged transition after the room was closed locally"
                );
                Ok(plan.to)
            }
        }
    }

    fn abort_transition(&self, room: &RoomId, plan_id: PlanId) -> Result<(), ServiceError> {
        match self.confirmations.get_mut(room) {
            Some(mut machine) => Ok(machine.abort(plan_id)?),
            None => Ok(()),
        }
    }

    /// Snapshot of a room's confirmation machine.
    pub fn snapshot(&self, room: &RoomId) -> Option<Snapshot> {
        self.confirmations.get(room).map(|machine| machine.snapshot())
    }

    /// Plan `event` on the room's confirmation machine, run `work` (the backend call) and
    /// apply the plan only when `work` succeeds in time. Otherwise the plan is aborted and the
    /// local state is left untouched.
    pub async fn run_transition<F, Fut, T>(
        &self,
        room: &RoomId,
        event: ConfirmationEvent,
        work: F,
    ) -> Result<(T, ConfirmationState), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let room_gate = self.transition_gate(room);
        let gate = room_gate.lock().await;
        let plan = self.plan_transition(room, event.clone())?;
        let plan_id = plan.id;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(abort_err) = self.abort_transition(room, plan_id) {
                        warn!(
                            room = %room,
                            event = ?event,
                            plan_id = %plan_id,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_planned_transition(room, &plan)?;
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(room, plan_id) {
                    warn!(
                        room = %room,
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(gate);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::{AppState, SharedState, UserSession};
    use crate::{
        api::{auth::{Credentials, TokenStore}, fake::FakeBackend, models::EntrantId},
        config::AppConfig,
    };

    /// State backed by `backend`, signed in as `user`.
    pub(crate) async fn signed_in(backend: Arc<FakeBackend>, user: &str) -> SharedState {
        signed_in_with(backend, user, AppConfig::default()).await
    }

    pub(crate) async fn signed_in_with(
        backend: Arc<FakeBackend>,
        user: &str,
        config: AppConfig,
    ) -> SharedState {
        let state = AppState::new(backend, Arc::new(TokenStore::new()), config);
        state
            .sign_in(
                UserSession {
                    user_id: EntrantId::new(user),
                    display_name: None,
                },
                Credentials {
                    session_token: Some("token".into()),
                    federated_token: None,
                },
            )
            .await;
        state
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{test_support::signed_in, *};
    use crate::api::fake::{FakeBackend, room, status_error};

    fn creator_machine() -> ConfirmationMachine {
        ConfirmationMachine::new(
            EntrantId::new("creator"),
            [EntrantId::new("creator"), EntrantId::new("rival")],
        )
    }

    #[tokio::test]
    async fn failed_work_leaves_state_untouched() {
        let backend = Arc::new(FakeBackend::default());
        let state = signed_in(backend, "creator").await;
        let room_id = RoomId::new("r1");
        state
            .confirmations()
            .insert(room_id.clone(), creator_machine());

        let outcome: Result<((), ConfirmationState), ServiceError> = state
            .run_transition(
                &room_id,
                ConfirmationEvent::Submit {
                    by: EntrantId::new("creator"),
                },
                || async { Err(ServiceError::Api(status_error(500))) },
            )
            .await;

        assert!(outcome.is_err());
        let snapshot = state.snapshot(&room_id).unwrap();
        assert_eq!(snapshot.state, ConfirmationState::NoResult);
        assert_eq!(snapshot.pending, None);
    }

    #[tokio::test]
    async fn successful_work_applies_plan() {
        let backend = Arc::new(FakeBackend::with_room(room("r1", "creator", &[])));
        let state = signed_in(backend, "creator").await;
        let room_id = RoomId::new("r1");
        state
            .confirmations()
            .insert(room_id.clone(), creator_machine());

        let (value, next) = state
            .run_transition(
                &room_id,
                ConfirmationEvent::Submit {
                    by: EntrantId::new("creator"),
                },
                || async { Ok(7) },
            )
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(next, ConfirmationState::PendingConfirmation);
    }

    #[tokio::test]
    async fn slow_transition_does_not_block_other_rooms() {
        let backend = Arc::new(FakeBackend::default());
        let state = signed_in(backend, "creator").await;
        let (slow, fast) = (RoomId::new("slow"), RoomId::new("fast"));
        state.confirmations().insert(slow.clone(), creator_machine());
        state.confirmations().insert(fast.clone(), creator_machine());

        let (release, released) = tokio::sync::oneshot::channel::<()>();
        let pending = {
            let state = state.clone();
            let slow = slow.clone();
            tokio::spawn(async move {
                state
                    .run_transition(
                        &slow,
                        ConfirmationEvent::Submit {
                            by: EntrantId::new("creator"),
                        },
                        move || async move {
                            let _ = released.await;
                            Ok(())
                        },
                    )
                    .await
            })
        };
        while state.snapshot(&slow).unwrap().pending.is_none() {
            tokio::task::yield_now().await;
        }

        let (_, next) = tokio::time::timeout(
            Duration::from_secs(1),
            state.run_transition(
                &fast,
                ConfirmationEvent::Submit {
                    by: EntrantId::new("creator"),
                },
                || async { Ok(()) },
            ),
        )
        .await
        .expect("other room was blocked")
        .unwrap();
        assert_eq!(next, ConfirmationState::PendingConfirmation);

        release.send(()).unwrap();
        let (_, next) = pending.await.unwrap().unwrap();
        assert_eq!(next, ConfirmationState::PendingConfirmation);
    }

    #[tokio::test]
    async fn acknowledged_transition_survives_forgotten_room() {
        let backend = Arc::new(FakeBackend::default());
        let state = signed_in(backend, "creator").await;
        let room_id = RoomId::new("r1");
        state.confirmations().insert(room_id.clone(), creator_machine());

        let closer = state.clone();
        let closed = room_id.clone();
        let (_, next) = state
            .run_transition(
                &room_id,
                ConfirmationEvent::Submit {
                    by: EntrantId::new("creator"),
                },
                move || async move {
                    closer.forget_room(&closed);
                    Ok(())
                },
            )
            .await
            .unwrap();

        assert_eq!(next, ConfirmationState::PendingConfirmation);
        assert!(state.snapshot(&room_id).is_none());
    }

    #[tokio::test]
    async fn sign_out_clears_room_state() {
        let backend = Arc::new(FakeBackend::default());
        let state = signed_in(backend, "creator").await;
        state
            .scoreboards()
            .insert(RoomId::new("r1"), Scoreboard::default());

        state.sign_out().await;

        assert!(state.scoreboards().is_empty());
        assert!(state.session().await.is_none());
        assert!(!state.tokens().is_signed_in());
        assert!(matches!(
            state.current_user().await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn janitor_tears_down_when_tokens_are_cleared() {
        let backend = Arc::new(FakeBackend::default());
        let state = signed_in(backend, "creator").await;
        let janitor = state.spawn_session_janitor();
        state
            .panels()
            .insert(RoomId::new("r1"), TeamAssignment::default());

        state.tokens().clear().await;

        for _ in 0..50 {
            if state.session().await.is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(state.session().await.is_none());
        assert!(state.panels().is_empty());
        janitor.abort();
    }
}
