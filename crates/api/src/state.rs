//! Shared application state.

use service::{CatalogService, CustomerService, OrderService, ReportService};
use store::Store;

/// Services shared by every handler. All of them sit on the same store.
pub struct AppState<S: Store> {
    pub orders: OrderService<S>,
    pub customers: CustomerService<S>,
    pub catalog: CatalogService<S>,
    pub reports: ReportService<S>,
}

impl<S: Store + Clone> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            customers: CustomerService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            reports: ReportService::new(store),
        }
    }
}
