//! Customer endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{Address, AddressFields, CustomerId, CustomerWithAddress};
use serde::{Deserialize, Serialize};
use service::NewCustomer;
use store::Store;

use super::parse_id;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CustomerFilter {
    pub city: Option<String>,
}

#[derive(Serialize)]
pub struct AddressResponse {
    pub id: String,
    pub street: String,
    pub city: String,
    pub country: String,
    pub postal_code: String,
}

impl From<&Address> for AddressResponse {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id().to_string(),
            street: address.street().to_string(),
            city: address.city().to_string(),
            country: address.country().to_string(),
            postal_code: address.postal_code().to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: Option<AddressResponse>,
}

impl From<&CustomerWithAddress> for CustomerResponse {
    fn from(value: &CustomerWithAddress) -> Self {
        Self {
            id: value.customer.id().to_string(),
            name: value.customer.name().to_string(),
            email: value.customer.email().to_string(),
            address: value.address.as_ref().map(AddressResponse::from),
        }
    }
}

/// POST /api/customers
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<NewCustomer>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let created = state.customers.create_customer(req).await?;
    Ok((StatusCode::CREATED, Json(CustomerResponse::from(&created))))
}

/// GET /api/customers
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(filter): ApiQuery<CustomerFilter>,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    let customers = match filter.city.as_deref() {
        Some(city) => state.customers.list_customers_by_city(city).await?,
        None => state.customers.list_customers().await?,
    };
    Ok(Json(customers.iter().map(CustomerResponse::from).collect()))
}

/// GET /api/customers/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer_id: CustomerId = parse_id(&id)?;
    let customer = state.customers.get_customer(customer_id).await?;
    Ok(Json(CustomerResponse::from(&customer)))
}

/// GET /api/customers/email/{email}
#[tracing::instrument(skip(state))]
pub async fn get_by_email<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(email): Path<String>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer = state.customers.get_customer_by_email(&email).await?;
    Ok(Json(CustomerResponse::from(&customer)))
}

/// PUT /api/customers/{id}/address
#[tracing::instrument(skip(state, fields))]
pub async fn update_address<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    ApiJson(fields): ApiJson<AddressFields>,
) -> Result<Json<AddressResponse>, ApiError> {
    let customer_id: CustomerId = parse_id(&id)?;
    let address = state.customers.update_address(customer_id, fields).await?;
    Ok(Json(AddressResponse::from(&address)))
}

/// DELETE /api/customers/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let customer_id: CustomerId = parse_id(&id)?;
    state.customers.delete_customer(customer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
