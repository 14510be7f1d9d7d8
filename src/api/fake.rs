//! In-memory backend used by service tests.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::Duration,
};

use futures::future::BoxFuture;
use reqwest::StatusCode;

use super::{
    PadelBackend,
    error::{ApiError, ApiResult},
    models::{
        AdminStatsDto, AssignTeamsRequest, CategoryDto, CategoryId, CreateRoomRequest,
        DisputeRequest, EntrantDto, EntrantId, JoinRoomRequest, LogEntryDto, MatchResultDto,
        RankingEntryDto, RemoteResultStatus, RoomDto, RoomId, RoomStatus, SubmitResultRequest,
    },
};

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub rooms: Mutex<HashMap<RoomId, RoomDto>>,
    pub results: Mutex<HashMap<RoomId, MatchResultDto>>,
    pub categories: Mutex<Vec<CategoryDto>>,
    pub logs_export: Mutex<Vec<u8>>,
    pub create_delay: Mutex<Option<Duration>>,
    pub assignments: Mutex<Vec<(RoomId, AssignTeamsRequest)>>,
    pub submissions: Mutex<Vec<(RoomId, SubmitResultRequest)>>,
    calls: Mutex<Vec<&'static str>>,
    failure: Mutex<Option<ApiError>>,
}

pub(crate) fn room(id: &str, creator: &str, entrants: &[(&str, Option<f64>)]) -> RoomDto {
    RoomDto {
        id: RoomId::new(id),
        name: format!("room {id}"),
        code: Some("AB12CD".into()),
        creator_id: EntrantId::new(creator),
        status: RoomStatus::Waiting,
        entrants: entrants
            .iter()
            .map(|(entrant, rating)| EntrantDto {
                id: EntrantId::new(*entrant),
                name: format!("player {entrant}"),
                rating: *rating,
                team: None,
            })
            .collect(),
        scheduled_at: None,
    }
}

pub(crate) fn status_error(code: u16) -> ApiError {
    ApiError::Status {
        path: "fake".into(),
        status: StatusCode::from_u16(code).unwrap(),
        message: format!("fake failure {code}"),
        error_type: None,
    }
}

impl FakeBackend {
    pub fn with_room(room: RoomDto) -> Self {
        let backend = Self::default();
        backend.insert_room(room);
        backend
    }

    pub fn insert_room(&self, room: RoomDto) {
        self.rooms.lock().unwrap().insert(room.id.clone(), room);
    }

    /// Make the next backend call fail with `err`.
    pub fn fail_next(&self, err: ApiError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub fn calls_to(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == name)
            .count()
    }

    fn record(&self, name: &'static str) -> ApiResult<()> {
        self.calls.lock().unwrap().push(name);
        match self.failure.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn find_room(&self, id: &RoomId) -> ApiResult<RoomDto> {
        self.rooms
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| status_error(404))
    }

    fn update_result(
        &self,
        id: &RoomId,
        apply: impl FnOnce(&mut MatchResultDto),
    ) -> ApiResult<()> {
        let mut results = self.results.lock().unwrap();
        let result = results.get_mut(id).ok_or_else(|| status_error(404))?;
        apply(result);
        Ok(())
    }
}

impl PadelBackend for FakeBackend {
    fn create_room(&self, request: CreateRoomRequest) -> BoxFuture<'static, ApiResult<RoomDto>> {
        let outcome = self.record("create_room").map(|()| {
            let mut created = room("created", "me", &[("me", Some(1500.0))]);
            created.name = request.name;
            self.insert_room(created.clone());
            created
        });
        let delay = *self.create_delay.lock().unwrap();
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            outcome
        })
    }

    fn join_room(&self, request: JoinRoomRequest) -> BoxFuture<'static, ApiResult<RoomDto>> {
        let outcome = self.record("join_room").and_then(|()| {
            self.rooms
                .lock()
                .unwrap()
                .values()
                .find(|room| room.code.as_deref() == Some(request.code.as_str()))
                .cloned()
                .ok_or_else(|| status_error(404))
        });
        Box::pin(async move { outcome })
    }

    fn list_rooms(&self) -> BoxFuture<'static, ApiResult<Vec<RoomDto>>> {
        let outcome = self
            .record("list_rooms")
            .map(|()| self.rooms.lock().unwrap().values().cloned().collect());
        Box::pin(async move { outcome })
    }

    fn fetch_room(&self, id: RoomId) -> BoxFuture<'static, ApiResult<RoomDto>> {
        let outcome = self.record("fetch_room").and_then(|()| self.find_room(&id));
        Box::pin(async move { outcome })
    }

    fn assign_teams(
        &self,
        id: RoomId,
        request: AssignTeamsRequest,
    ) -> BoxFuture<'static, ApiResult<()>> {
        let outcome = self.record("assign_teams").map(|()| {
            if let Some(room) = self.rooms.lock().unwrap().get_mut(&id) {
                for entrant in room.entrants.iter_mut() {
                    entrant.team = request.assignments.get(&entrant.id).copied();
                }
            }
            self.assignments.lock().unwrap().push((id, request));
        });
        Box::pin(async move { outcome })
    }

    fn start_match(&self, id: RoomId) -> BoxFuture<'static, ApiResult<()>> {
        let outcome = self.record("start_match").map(|()| {
            if let Some(room) = self.rooms.lock().unwrap().get_mut(&id) {
                room.status = RoomStatus::Active;
            }
        });
        Box::pin(async move { outcome })
    }

    fn delete_room(&self, id: RoomId) -> BoxFuture<'static, ApiResult<()>> {
        let outcome = self.record("delete_room").and_then(|()| {
            self.rooms
                .lock()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| status_error(404))
        });
        Box::pin(async move { outcome })
    }

    fn submit_result(
        &self,
        id: RoomId,
        request: SubmitResultRequest,
    ) -> BoxFuture<'static, ApiResult<()>> {
        let outcome = self.record("submit_result").map(|()| {
            self.results.lock().unwrap().insert(
                id.clone(),
                MatchResultDto {
                    sets: request.sets.clone(),
                    winner: Some(request.winner),
                    status: RemoteResultStatus::PendingConfirmation,
                    submitted_by: None,
                    dispute_reason: None,
                },
            );
            self.submissions.lock().unwrap().push((id, request));
        });
        Box::pin(async move { outcome })
    }

    fn fetch_result(&self, id: RoomId) -> BoxFuture<'static, ApiResult<Option<MatchResultDto>>> {
        let outcome = self
            .record("fetch_result")
            .map(|()| self.results.lock().unwrap().get(&id).cloned());
        Box::pin(async move { outcome })
    }

    fn confirm_result(&self, id: RoomId) -> BoxFuture<'static, ApiResult<()>> {
        let outcome = self.record("confirm_result").and_then(|()| {
            self.update_result(&id, |result| {
                result.status = RemoteResultStatus::Confirmed;
            })
        });
        Box::pin(async move { outcome })
    }

    fn dispute_result(
        &self,
        id: RoomId,
        request: DisputeRequest,
    ) -> BoxFuture<'static, ApiResult<()>> {
        let outcome = self.record("dispute_result").and_then(|()| {
            self.update_result(&id, |result| {
                result.status = RemoteResultStatus::Disputed;
                result.dispute_reason = Some(request.reason);
            })
        });
        Box::pin(async move { outcome })
    }

    fn fetch_ranking(&self) -> BoxFuture<'static, ApiResult<Vec<RankingEntryDto>>> {
        let outcome = self.record("fetch_ranking").map(|()| Vec::new());
        Box::pin(async move { outcome })
    }

    fn fetch_category_ranking(
        &self,
        _id: CategoryId,
    ) -> BoxFuture<'static, ApiResult<Vec<RankingEntryDto>>> {
        let outcome = self.record("fetch_category_ranking").map(|()| Vec::new());
        Box::pin(async move { outcome })
    }

    fn fetch_categories(&self) -> BoxFuture<'static, ApiResult<Vec<CategoryDto>>> {
        let outcome = self
            .record("fetch_categories")
            .map(|()| self.categories.lock().unwrap().clone());
        Box::pin(async move { outcome })
    }

    fn fetch_stats(&self) -> BoxFuture<'static, ApiResult<AdminStatsDto>> {
        let outcome = self.record("fetch_stats").map(|()| AdminStatsDto::default());
        Box::pin(async move { outcome })
    }

    fn fetch_logs(&self) -> BoxFuture<'static, ApiResult<Vec<LogEntryDto>>> {
        let outcome = self.record("fetch_logs").map(|()| Vec::new());
        Box::pin(async move { outcome })
    }

    fn export_logs(&self) -> BoxFuture<'static, ApiResult<Vec<u8>>> {
        let outcome = self
            .record("export_logs")
            .map(|()| self.logs_export.lock().unwrap().clone());
        Box::pin(async move { outcome })
    }

    fn purge_logs(&self) -> BoxFuture<'static, ApiResult<()>> {
        let outcome = self.record("purge_logs");
        Box::pin(async move { outcome })
    }

    fn health_check(&self) -> BoxFuture<'static, ApiResult<()>> {
        let outcome = self.record("health_check");
        Box::pin(async move { outcome })
    }
}
