//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, ProductId};
use serde::Serialize;

use crate::error::{DomainError, Result};
use crate::value_objects::Money;

use super::{LineItem, OrderStatus};

/// Stock to hand back to a product after a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockReversal {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Order aggregate root.
///
/// Owns its line items. `total` is derived from them and updated on every
/// change to the item list; there is no way to set it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    /// Unique order identifier.
    id: OrderId,

    /// Customer who placed the order. Fixed at creation.
    customer_id: CustomerId,

    /// When the order was placed.
    created_at: DateTime<Utc>,

    /// Current status of the order.
    status: OrderStatus,

    /// Sum of the item subtotals.
    total: Money,

    /// Items in insertion order, at most one per product.
    items: Vec<LineItem>,
}

impl Order {
    /// Creates an empty order in status NEW, timestamped now.
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            id: OrderId::new(),
            customer_id,
            created_at: Utc::now(),
            status: OrderStatus::New,
            total: Money::zero(),
            items: Vec::new(),
        }
    }

    /// Rebuilds an order from persisted fields. The total is recomputed.
    pub fn restore(
        id: OrderId,
        customer_id: CustomerId,
        created_at: DateTime<Utc>,
        status: OrderStatus,
        items: Vec<LineItem>,
    ) -> Self {
        let mut order = Self {
            id,
            customer_id,
            created_at,
            status,
            total: Money::zero(),
            items,
        };
        order.total = order.items.iter().map(LineItem::subtotal).sum();
        order
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn contains_product(&self, product_id: ProductId) -> bool {
        self.items.iter().any(|item| item.product_id() == product_id)
    }
}

// Mutators
impl Order {
    /// Attaches an item and adds its subtotal to the total.
    ///
    /// Rejects an item built for another order, a second item for a product
    /// that is already on the order, and an item that would overflow the
    /// total.
    pub fn add_item(&mut self, item: LineItem) -> Result<()> {
        if item.order_id() != self.id {
            return Err(DomainError::validation(
                "line item",
                format!("belongs to order {}, not {}", item.order_id(), self.id),
            ));
        }
        if self.contains_product(item.product_id()) {
            return Err(DomainError::DuplicateProduct {
                product_id: item.product_id(),
            });
        }

        let total = self.total.checked_add(item.subtotal()).ok_or_else(|| {
            DomainError::validation("total", format!("adding {} overflows", item.subtotal()))
        })?;

        self.items.push(item);
        self.total = total;
        Ok(())
    }

    /// Moves the order to `next` if the transition table allows it.
    ///
    /// Moving to CANCELLED goes through [`Order::cancel`], so the returned
    /// reversals must be applied to product stock by the caller. For any
    /// other target the list is empty.
    #[must_use = "cancellation returns stock that has to be put back"]
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<Vec<StockReversal>> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        if next == OrderStatus::Cancelled {
            return self.cancel();
        }

        self.status = next;
        Ok(Vec::new())
    }

    /// Cancels the order and returns the stock each item held.
    #[must_use = "cancellation returns stock that has to be put back"]
    pub fn cancel(&mut self) -> Result<Vec<StockReversal>> {
        if !self.status.can_cancel() {
            return Err(DomainError::NotCancellable {
                status: self.status,
            });
        }

        self.status = OrderStatus::Cancelled;
        Ok(self
            .items
            .iter()
            .map(|item| StockReversal {
                product_id: item.product_id(),
                quantity: item.quantity(),
            })
            .collect())
    }
}
