//! Read-only reports.

use domain::{CustomerTotal, Product};
use store::{OrderStore, ProductStore, Store};

use crate::error::Result;

/// Service for aggregate reports. Never writes.
pub struct ReportService<S: Store> {
    store: S,
}

impl<S: Store> ReportService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lifetime spend per customer, excluding cancelled orders.
    ///
    /// Customers without qualifying orders are listed with zero. Sorted by
    /// total descending, then name.
    #[tracing::instrument(skip(self))]
    pub async fn totals_by_customer(&self) -> Result<Vec<CustomerTotal>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.totals_by_customer().await?)
    }

    /// Products with fewer than `threshold` units in stock, lowest first.
    #[tracing::instrument(skip(self))]
    pub async fn low_stock(&self, threshold: u32) -> Result<Vec<Product>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_products_with_stock_below(threshold).await?)
    }
}
