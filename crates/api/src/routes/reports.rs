//! Reporting endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use store::Store;

use super::AmountResponse;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CustomerTotalResponse {
    pub customer_id: String,
    pub customer_name: String,
    pub total: AmountResponse,
}

/// GET /api/reports/customer-totals
#[tracing::instrument(skip(state))]
pub async fn customer_totals<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CustomerTotalResponse>>, ApiError> {
    let totals = state
        .reports
        .totals_by_customer()
        .await?
        .into_iter()
        .map(|row| CustomerTotalResponse {
            customer_id: row.customer_id.to_string(),
            customer_name: row.customer_name,
            total: row.total.into(),
        })
        .collect();
    Ok(Json(totals))
}
