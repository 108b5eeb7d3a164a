//! Order line items.

use common::{LineItemId, OrderId, ProductId};
use serde::Serialize;

use crate::error::{DomainError, Result};
use crate::product::Product;
use crate::value_objects::Money;

/// One product, a quantity, and the unit price paid.
///
/// The unit price is copied from the product when the item is created and is
/// never refreshed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    id: LineItemId,
    order_id: OrderId,
    product_id: ProductId,
    quantity: u32,
    unit_price: Money,
}

impl LineItem {
    /// Creates an item for `order_id` priced at the product's current price.
    pub fn new(order_id: OrderId, product: &Product, quantity: u32) -> Result<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity", "must be greater than zero"));
        }
        if !product.price().is_positive() {
            return Err(DomainError::validation(
                "unit_price",
                "must be greater than zero",
            ));
        }
        if product.price().checked_mul(quantity).is_none() {
            return Err(DomainError::validation(
                "quantity",
                format!("{quantity} x {} overflows the subtotal", product.price()),
            ));
        }

        Ok(Self {
            id: LineItemId::new(),
            order_id,
            product_id: product.id(),
            quantity,
            unit_price: product.price(),
        })
    }

    /// Rebuilds an item from persisted fields.
    pub fn restore(
        id: LineItemId,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            id,
            order_id,
            product_id,
            quantity,
            unit_price,
        }
    }

    pub fn id(&self) -> LineItemId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Returns `unit_price * quantity`.
    ///
    /// [`LineItem::new`] rejects items whose subtotal does not fit, so the
    /// clamp only matters for rows restored from storage.
    pub fn subtotal(&self) -> Money {
        self.unit_price.saturating_mul(self.quantity)
    }
}
