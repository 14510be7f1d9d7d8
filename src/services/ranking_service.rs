//! Read-only ranking tables and rating categories.

use tracing::debug;

use crate::{
    api::models::{CategoryDto, CategoryId, RankingEntryDto},
    dto::ranking::CategoryLookupResponse,
    error::ServiceError,
    state::{SharedState, teams::DEFAULT_RATING},
};

pub async fn global_ranking(state: &SharedState) -> Result<Vec<RankingEntryDto>, ServiceError> {
    state.current_user().await?;
    Ok(sorted(state.backend().fetch_ranking().await?))
}

pub async fn category_ranking(
    state: &SharedState,
    id: CategoryId,
) -> Result<Vec<RankingEntryDto>, ServiceError> {
    state.current_user().await?;
    Ok(sorted(state.backend().fetch_category_ranking(id).await?))
}

pub async fn categories(state: &SharedState) -> Result<Vec<CategoryDto>, ServiceError> {
    state.current_user().await?;
    Ok(state.backend().fetch_categories().await?)
}

/// Category whose rating band contains `rating` (1500 when absent).
pub async fn category_for_rating(
    state: &SharedState,
    rating: Option<f64>,
) -> Result<CategoryLookupResponse, ServiceError> {
    state.current_user().await?;
    let rating = rating.unwrap_or(DEFAULT_RATING);
    let categories = state.backend().fetch_categories().await?;
    let category = find_category(categories, rating).ok_or_else(|| {
        ServiceError::NotFound(format!("no category covers a rating of {rating}"))
    })?;
    debug!(rating, category = %category.id, "category resolved");
    Ok(CategoryLookupResponse { rating, category })
}

/// First category containing `rating`, in backend order.
fn find_category(categories: Vec<CategoryDto>, rating: f64) -> Option<CategoryDto> {
    categories
        .into_iter()
        .find(|category| category.contains(rating))
}

/// Rows with an explicit position first, in position order; the rest by rating, highest first.
fn sorted(mut entries: Vec<RankingEntryDto>) -> Vec<RankingEntryDto> {
    entries.sort_by(|left, right| match (left.position, right.position) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => right
            .rating
            .unwrap_or(DEFAULT_RATING)
            .total_cmp(&left.rating.unwrap_or(DEFAULT_RATING)),
    });
    entries
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{api::fake::FakeBackend, api::models::EntrantId, state::test_support::signed_in};

    fn category(id: &str, min: Option<f64>, max: Option<f64>) -> CategoryDto {
        CategoryDto {
            id: CategoryId::new(id),
            name: format!("categoria {id}"),
            min_rating: min,
            max_rating: max,
        }
    }

    fn entry(id: &str, position: Option<u32>, rating: Option<f64>) -> RankingEntryDto {
        RankingEntryDto {
            position,
            entrant_id: EntrantId::new(id),
            name: id.into(),
            rating,
            category_id: None,
            matches_played: None,
        }
    }

    #[tokio::test]
    async fn lookup_uses_half_open_bands() {
        let backend = Arc::new(FakeBackend::default());
        *backend.categories.lock().unwrap() = vec![
            category("3", Some(1800.0), None),
            category("4", Some(1500.0), Some(1800.0)),
            category("5", None, Some(1500.0)),
        ];
        let state = signed_in(backend, "ana").await;

        let found = category_for_rating(&state, Some(1800.0)).await.unwrap();
        assert_eq!(found.category.id, CategoryId::new("3"));

        let found = category_for_rating(&state, None).await.unwrap();
        assert_eq!(found.rating, 1500.0);
        assert_eq!(found.category.id, CategoryId::new("4"));

        let found = category_for_rating(&state, Some(900.0)).await.unwrap();
        assert_eq!(found.category.id, CategoryId::new("5"));
    }

    #[tokio::test]
    async fn lookup_without_match_is_not_found() {
        let backend = Arc::new(FakeBackend::default());
        *backend.categories.lock().unwrap() = vec![category("1", Some(2000.0), None)];
        let state = signed_in(backend, "ana").await;

        let err = category_for_rating(&state, Some(1200.0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn ranking_rows_are_ordered() {
        let rows = sorted(vec![
            entry("c", None, Some(1400.0)),
            entry("b", Some(2), None),
            entry("d", None, None),
            entry("a", Some(1), None),
        ]);
        let ids: Vec<&str> = rows.iter().map(|row| row.entrant_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "d", "c"]);
    }
}
