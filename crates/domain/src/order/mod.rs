//! Order aggregate and related types.

mod aggregate;
mod line_item;
mod state;

pub use aggregate::{Order, StockReversal};
pub use line_item::LineItem;
pub use state::OrderStatus;

use common::ProductId;
use serde::Serialize;

use crate::product::Product;

/// An order together with the products its items refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub products: Vec<Product>,
}

impl OrderDetails {
    /// Returns the loaded product with the given id.
    pub fn product(&self, product_id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id() == product_id)
    }

    /// Pairs every line item with its product, in item order.
    ///
    /// Items whose product was not loaded are skipped.
    pub fn lines(&self) -> impl Iterator<Item = (&LineItem, &Product)> + '_ {
        self.order
            .items()
            .iter()
            .filter_map(|item| self.product(item.product_id()).map(|p| (item, p)))
    }
}
