//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{Product, ProductId};
use serde::{Deserialize, Serialize};
use service::NewProduct;
use store::{Page, PageRequest, Store};

use super::{AmountResponse, parse_id};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl ProductQuery {
    fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(PageRequest::DEFAULT_SIZE),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AssignCategoriesRequest {
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStockRequest {
    pub stock: u32,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price: AmountResponse,
    pub stock: u32,
    pub category_ids: Vec<String>,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id().to_string(),
            name: product.name().to_string(),
            price: product.price().into(),
            stock: product.stock(),
            category_ids: product.category_ids().map(|id| id.to_string()).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        let has_next = page.has_next();
        Self {
            items: page.items,
            page: page.page,
            size: page.size,
            total_items: page.total_items,
            total_pages,
            has_next,
        }
    }
}

/// POST /api/products
#[tracing::instrument(skip(state, req), fields(name = %req.name))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = state.catalog.create_product(req).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(&product))))
}

/// GET /api/products
///
/// With `?category=` only that category's products are paged; otherwise
/// the whole catalog is.
#[tracing::instrument(skip(state, query))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<Json<PageResponse<ProductResponse>>, ApiError> {
    let request = query.page_request();
    let page = match query.category.as_deref() {
        Some(category) => state.catalog.products_by_category(category, request).await?,
        None => Page::slice(state.catalog.list_products().await?, request),
    };
    Ok(Json(page.map(|p| ProductResponse::from(&p)).into()))
}

/// GET /api/products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    let product = state.catalog.get_product(product_id).await?;
    Ok(Json(ProductResponse::from(&product)))
}

/// POST /api/products/{id}/categories
#[tracing::instrument(skip(state, req))]
pub async fn assign_categories<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AssignCategoriesRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    let product = state
        .catalog
        .assign_categories(product_id, &req.categories)
        .await?;
    Ok(Json(ProductResponse::from(&product)))
}

/// PUT /api/products/{id}/stock
#[tracing::instrument(skip(state, req))]
pub async fn update_stock<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateStockRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    let product = state.catalog.update_stock(product_id, req.stock).await?;
    Ok(Json(ProductResponse::from(&product)))
}

/// GET /api/products/low-stock
#[tracing::instrument(skip(state, query))]
pub async fn low_stock<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(query): ApiQuery<LowStockQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    let products = state.reports.low_stock(threshold).await?;
    Ok(Json(products.iter().map(ProductResponse::from).collect()))
}
