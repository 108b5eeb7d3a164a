//! HTTP API server with observability for the store backend.
//!
//! Exposes customers, the product catalog, orders and reports as JSON over
//! REST, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api", get(routes::index::endpoints))
        .route(
            "/api/customers",
            post(routes::customers::create::<S>).get(routes::customers::list::<S>),
        )
        .route(
            "/api/customers/{id}",
            get(routes::customers::get::<S>).delete(routes::customers::delete::<S>),
        )
        .route(
            "/api/customers/email/{email}",
            get(routes::customers::get_by_email::<S>),
        )
        .route(
            "/api/customers/{id}/address",
            put(routes::customers::update_address::<S>),
        )
        .route(
            "/api/customers/{id}/orders",
            post(routes::orders::create::<S>).get(routes::orders::list_for_customer::<S>),
        )
        .route(
            "/api/products",
            post(routes::products::create::<S>).get(routes::products::list::<S>),
        )
        .route("/api/products/low-stock", get(routes::products::low_stock::<S>))
        .route("/api/products/{id}", get(routes::products::get::<S>))
        .route(
            "/api/products/{id}/categories",
            post(routes::products::assign_categories::<S>),
        )
        .route(
            "/api/products/{id}/stock",
            put(routes::products::update_stock::<S>),
        )
        .route("/api/categories", get(routes::categories::list::<S>))
        .route("/api/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/api/orders/{id}/status",
            put(routes::orders::change_status::<S>),
        )
        .route("/api/orders/{id}/cancel", put(routes::orders::cancel::<S>))
        .route(
            "/api/reports/customer-totals",
            get(routes::reports::customer_totals::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
