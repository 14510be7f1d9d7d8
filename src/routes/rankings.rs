use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use axum_valid::Valid;

use crate::{
    api::models::{CategoryDto, CategoryId, RankingEntryDto},
    dto::ranking::{CategoryLookupQuery, CategoryLookupResponse},
    error::AppError,
    services::ranking_service,
    state::SharedState,
};

/// Ranking tables and category routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/ranking", get(global_ranking))
        .route("/ranking/categories/{id}", get(category_ranking))
        .route("/categories", get(categories))
        .route("/categories/lookup", get(category_lookup))
}

#[utoipa::path(
    get,
    path = "/ranking",
    tag = "ranking",
    responses((status = 200, description = "Global ranking", body = [RankingEntryDto]))
)]
pub async fn global_ranking(
    State(state): State<SharedState>,
) -> Result<Json<Vec<RankingEntryDto>>, AppError> {
    Ok(Json(ranking_service::global_ranking(&state).await?))
}

#[utoipa::path(
    get,
    path = "/ranking/categories/{id}",
    tag = "ranking",
    params(("id" = String, Path, description = "Identifier of the category")),
    responses((status = 200, description = "Ranking of one category", body = [RankingEntryDto]))
)]
pub async fn category_ranking(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RankingEntryDto>>, AppError> {
    Ok(Json(
        ranking_service::category_ranking(&state, CategoryId::from(id)).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/categories",
    tag = "ranking",
    responses((status = 200, description = "Rating categories", body = [CategoryDto]))
)]
pub async fn categories(
    State(state): State<SharedState>,
) -> Result<Json<Vec<CategoryDto>>, AppError> {
    Ok(Json(ranking_service::categories(&state).await?))
}

/// Category a rating falls in.
#[utoipa::path(
    get,
    path = "/categories/lookup",
    tag = "ranking",
    params(CategoryLookupQuery),
    responses(
        (status = 200, description = "Matching category", body = CategoryLookupResponse),
        (status = 404, description = "No category covers the rating")
    )
)]
pub async fn category_lookup(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<CategoryLookupQuery>>,
) -> Result<Json<CategoryLookupResponse>, AppError> {
    Ok(Json(
        ranking_service::category_for_rating(&state, query.rating).await?,
    ))
}
