/// Admin dashboard operations.
pub mod admin_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Ranking tables and rating categories.
pub mod ranking_service;
/// Score entry and result confirmation.
pub mod result_service;
/// Room lifecycle operations.
pub mod room_service;
/// Background room polling.
pub mod room_watcher;
/// Local session handling.
pub mod session_service;
/// Team assignment panel.
pub mod team_service;
