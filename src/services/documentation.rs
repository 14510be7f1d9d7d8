use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the padel front service.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::sign_in,
        crate::routes::session::current_session,
        crate::routes::session::sign_out,
        crate::routes::rooms::list_rooms,
        crate::routes::rooms::create_room,
        crate::routes::rooms::join_room,
        crate::routes::rooms::get_room,
        crate::routes::rooms::delete_room,
        crate::routes::rooms::start_match,
        crate::routes::rooms::start_watching,
        crate::routes::rooms::watch_state,
        crate::routes::rooms::stop_watching,
        crate::routes::teams::open_panel,
        crate::routes::teams::get_panel,
        crate::routes::teams::close_panel,
        crate::routes::teams::move_entrant,
        crate::routes::teams::remove_entrant,
        crate::routes::teams::auto_assign,
        crate::routes::teams::submit_panel,
        crate::routes::scoreboard::open_scoreboard,
        crate::routes::scoreboard::get_scoreboard,
        crate::routes::scoreboard::close_scoreboard,
        crate::routes::scoreboard::update_set,
        crate::routes::scoreboard::add_third_set,
        crate::routes::scoreboard::remove_third_set,
        crate::routes::scoreboard::submit_result,
        crate::routes::scoreboard::get_result,
        crate::routes::scoreboard::confirm_result,
        crate::routes::scoreboard::dispute_result,
        crate::routes::rankings::global_ranking,
        crate::routes::rankings::category_ranking,
        crate::routes::rankings::categories,
        crate::routes::rankings::category_lookup,
        crate::routes::admin::stats,
        crate::routes::admin::logs,
        crate::routes::admin::export_logs,
        crate::routes::admin::purge_logs,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::api::error::ErrorCategory,
            crate::dto::health::HealthResponse,
            crate::dto::common::ActionResponse,
            crate::dto::session::SignInRequest,
            crate::dto::session::SessionView,
            crate::dto::rooms::CreateRoomBody,
            crate::dto::rooms::JoinRoomBody,
            crate::dto::rooms::RoomView,
            crate::dto::rooms::WatchView,
            crate::dto::teams::MoveEntrantRequest,
            crate::dto::teams::PanelView,
            crate::dto::scoreboard::UpdateSetRequest,
            crate::dto::scoreboard::AddSetRequest,
            crate::dto::scoreboard::DisputeBody,
            crate::dto::scoreboard::ScoreboardView,
            crate::dto::scoreboard::ResultView,
            crate::dto::ranking::CategoryLookupResponse,
            crate::dto::admin::LogExportResponse,
            crate::api::models::RoomDto,
            crate::api::models::MatchResultDto,
            crate::api::models::RankingEntryDto,
            crate::api::models::CategoryDto,
            crate::api::models::AdminStatsDto,
            crate::api::models::LogEntryDto,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Sign-in and sign-out"),
        (name = "rooms", description = "Room lifecycle and polling"),
        (name = "teams", description = "Team assignment panel"),
        (name = "results", description = "Score entry and result confirmation"),
        (name = "ranking", description = "Rankings and rating categories"),
        (name = "admin", description = "Admin dashboard"),
    )
)]
pub struct ApiDoc;
