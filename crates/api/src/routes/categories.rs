//! Category listing.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use store::Store;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub product_count: u64,
}

/// GET /api/categories
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state
        .catalog
        .list_categories()
        .await?
        .into_iter()
        .map(|summary| CategoryResponse {
            id: summary.category.id().to_string(),
            name: summary.category.name().to_string(),
            product_count: summary.product_count,
        })
        .collect();
    Ok(Json(categories))
}
