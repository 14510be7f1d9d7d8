//! Typed access to the remote padel REST backend.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod models;

use futures::future::BoxFuture;

use self::{
    error::ApiResult,
    models::{
        AdminStatsDto, AssignTeamsRequest, CategoryDto, CategoryId, CreateRoomRequest,
        DisputeRequest, JoinRoomRequest, LogEntryDto, MatchResultDto, RankingEntryDto, RoomDto,
        RoomId, SubmitResultRequest,
    },
};

/// Abstraction over the backend operations this client relies on.
pub trait PadelBackend: Send + Sync {
    fn create_room(&self, request: CreateRoomRequest) -> BoxFuture<'static, ApiResult<RoomDto>>;
    fn join_room(&self, request: JoinRoomRequest) -> BoxFuture<'static, ApiResult<RoomDto>>;
    fn list_rooms(&self) -> BoxFuture<'static, ApiResult<Vec<RoomDto>>>;
    fn fetch_room(&self, id: RoomId) -> BoxFuture<'static, ApiResult<RoomDto>>;
    fn assign_teams(
        &self,
        id: RoomId,
        request: AssignTeamsRequest,
    ) -> BoxFuture<'static, ApiResult<()>>;
    fn start_match(&self, id: RoomId) -> BoxFuture<'static, ApiResult<()>>;
    fn delete_room(&self, id: RoomId) -> BoxFuture<'static, ApiResult<()>>;

    fn submit_result(
        &self,
        id: RoomId,
        request: SubmitResultRequest,
    ) -> BoxFuture<'static, ApiResult<()>>;
    /// `Ok(None)` when no result has been submitted yet.
    fn fetch_result(&self, id: RoomId) -> BoxFuture<'static, ApiResult<Option<MatchResultDto>>>;
    fn confirm_result(&self, id: RoomId) -> BoxFuture<'static, ApiResult<()>>;
    fn dispute_result(
        &self,
        id: RoomId,
        request: DisputeRequest,
    ) -> BoxFuture<'static, ApiResult<()>>;

    fn fetch_ranking(&self) -> BoxFuture<'static, ApiResult<Vec<RankingEntryDto>>>;
    fn fetch_category_ranking(
        &self,
        id: CategoryId,
    ) -> BoxFuture<'static, ApiResult<Vec<RankingEntryDto>>>;
    fn fetch_categories(&self) -> BoxFuture<'static, ApiResult<Vec<CategoryDto>>>;

    fn fetch_stats(&self) -> BoxFuture<'static, ApiResult<AdminStatsDto>>;
    fn fetch_logs(&self) -> BoxFuture<'static, ApiResult<Vec<LogEntryDto>>>;
    fn export_logs(&self) -> BoxFuture<'static, ApiResult<Vec<u8>>>;
    fn purge_logs(&self) -> BoxFuture<'static, ApiResult<()>>;

    fn health_check(&self) -> BoxFuture<'static, ApiResult<()>>;
}
