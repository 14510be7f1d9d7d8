use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::api::models::CategoryDto;

/// Query of the category lookup.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct CategoryLookupQuery {
    /// Rating to place; defaults to the rating assumed for new players.
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub rating: Option<f64>,
}

/// Category a rating falls in.
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryLookupResponse {
    pub rating: f64,
    pub category: CategoryDto,
}
