//! Self-describing endpoint map served at `/api`.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

#[derive(Serialize)]
pub struct IndexResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub endpoints: &'static [Endpoint],
}

const fn endpoint(method: &'static str, path: &'static str, description: &'static str) -> Endpoint {
    Endpoint {
        method,
        path,
        description,
    }
}

static ENDPOINTS: &[Endpoint] = &[
    endpoint("POST", "/api/customers", "Register a customer with its address"),
    endpoint("GET", "/api/customers", "List customers, optionally ?city="),
    endpoint("GET", "/api/customers/{id}", "Get a customer"),
    endpoint("GET", "/api/customers/email/{email}", "Find a customer by email"),
    endpoint("PUT", "/api/customers/{id}/address", "Replace a customer's address"),
    endpoint("DELETE", "/api/customers/{id}", "Delete a customer and its orders"),
    endpoint("POST", "/api/products", "Add a product"),
    endpoint("GET", "/api/products", "List products, ?category=&page=&size="),
    endpoint("GET", "/api/products/{id}", "Get a product"),
    endpoint("POST", "/api/products/{id}/categories", "Assign categories by name"),
    endpoint("PUT", "/api/products/{id}/stock", "Set the stock level"),
    endpoint("GET", "/api/products/low-stock", "Products below ?threshold= (default 10)"),
    endpoint("GET", "/api/categories", "Categories with product counts"),
    endpoint("POST", "/api/customers/{id}/orders", "Place an order"),
    endpoint("GET", "/api/customers/{id}/orders", "A customer's orders, newest first"),
    endpoint("GET", "/api/orders/{id}", "Order with items and products"),
    endpoint("PUT", "/api/orders/{id}/status", "Change the order status"),
    endpoint("PUT", "/api/orders/{id}/cancel", "Cancel and restock"),
    endpoint("GET", "/api/reports/customer-totals", "Spend per customer"),
];

/// GET /api
pub async fn endpoints() -> Json<IndexResponse> {
    Json(IndexResponse {
        name: "store-api",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: ENDPOINTS,
    })
}
