//! Order lifecycle engine.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use domain::{
    CustomerId, DomainError, LineItem, Order, OrderDetails, OrderId, OrderStatus, ProductId,
    StockReversal,
};
use store::{CustomerStore, LineItemStore, OrderStore, ProductStore, Store, Transaction};

use crate::commands::CreateOrder;
use crate::error::{Result, ServiceError};

/// Puts the stock held by a cancelled order back on its products.
///
/// Products are locked in id order, the same order placement uses.
async fn restock<T: Transaction>(tx: &mut T, reversals: &[StockReversal]) -> Result<()> {
    let mut reversals = reversals.to_vec();
    reversals.sort_by_key(|reversal| reversal.product_id);
    for reversal in &reversals {
        let mut product = tx
            .get_product_for_update(reversal.product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", reversal.product_id))?;
        product.increment_stock(reversal.quantity);
        tx.save_product(&product).await?;
    }
    Ok(())
}

/// Service for placing and progressing orders.
///
/// Every operation runs in one store transaction. An early return drops the
/// transaction, which rolls back any stock already taken.
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Places an order, taking stock for every requested item.
    ///
    /// Either every item is accepted and the order is stored, or nothing
    /// changes.
    #[tracing::instrument(skip(self, cmd), fields(customer_id = %cmd.customer_id, items = cmd.items.len()))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<Order> {
        let start = Instant::now();
        let result = self.place(cmd).await;
        metrics::histogram!("order_create_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(order_id = %order.id(), total = %order.total(), "order placed");
            }
            Err(err) => {
                metrics::counter!("orders_rejected_total", "reason" => err.kind().as_str())
                    .increment(1);
                tracing::warn!(error = %err, "order rejected");
            }
        }
        result
    }

    async fn place(&self, cmd: CreateOrder) -> Result<Order> {
        let mut tx = self.store.begin().await?;

        tx.get_customer(cmd.customer_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("customer", cmd.customer_id))?;

        if cmd.items.is_empty() {
            return Err(DomainError::validation("items", "an order needs at least one item").into());
        }
        if cmd.items.iter().any(|requested| requested.quantity == 0) {
            return Err(DomainError::validation("quantity", "must be greater than zero").into());
        }

        // Rows are locked in id order so two orders over the same products
        // always queue instead of deadlocking.
        let wanted: BTreeSet<ProductId> = cmd.items.iter().map(|r| r.product_id).collect();
        let mut products = BTreeMap::new();
        for product_id in wanted {
            let product = tx
                .get_product_for_update(product_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("product", product_id))?;
            products.insert(product_id, product);
        }

        let mut order = Order::new(cmd.customer_id);

        for requested in &cmd.items {
            let product = products
                .get_mut(&requested.product_id)
                .ok_or_else(|| ServiceError::not_found("product", requested.product_id))?;

            if order.contains_product(product.id())
                || tx.line_item_exists(order.id(), product.id()).await?
            {
                return Err(DomainError::DuplicateProduct {
                    product_id: product.id(),
                }
                .into());
            }

            product.decrement_stock(requested.quantity)?;
            let item = LineItem::new(order.id(), product, requested.quantity)?;
            order.add_item(item)?;
        }

        for product in products.values() {
            tx.save_product(product).await?;
        }
        tx.save_order(&order).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Loads an order with its items and their products.
    #[tracing::instrument(skip(self))]
    pub async fn find_order_with_items(&self, order_id: OrderId) -> Result<OrderDetails> {
        let mut tx = self.store.begin().await?;
        tx.get_order_with_items(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", order_id))
    }

    /// Moves an order to `new_status`.
    ///
    /// A move to CANCELLED takes the same path as [`OrderService::cancel_order`]
    /// and returns the held stock.
    #[tracing::instrument(skip(self))]
    pub async fn change_status(&self, order_id: OrderId, new_status: OrderStatus) -> Result<Order> {
        let mut tx = self.store.begin().await?;
        let mut order = tx
            .get_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", order_id))?;

        let from = order.status();
        let reversals = order.transition_to(new_status)?;
        restock(&mut tx, &reversals).await?;

        tx.save_order(&order).await?;
        tx.commit().await?;

        metrics::counter!(
            "order_status_changes_total",
            "from" => from.as_str(),
            "to" => new_status.as_str()
        )
        .increment(1);
        if new_status == OrderStatus::Cancelled {
            metrics::counter!("orders_cancelled_total").increment(1);
        }
        tracing::info!(%order_id, %from, to = %new_status, "order status changed");
        Ok(order)
    }

    /// Cancels a NEW or PAID order and returns its stock to the products.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        let mut tx = self.store.begin().await?;
        let mut order = tx
            .get_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", order_id))?;

        let reversals = order.cancel()?;
        restock(&mut tx, &reversals).await?;

        tx.save_order(&order).await?;
        tx.commit().await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(%order_id, items = reversals.len(), "order cancelled");
        Ok(order)
    }

    /// Lists a customer's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        let mut tx = self.store.begin().await?;
        tx.get_customer(customer_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("customer", customer_id))?;
        Ok(tx.list_orders_by_customer(customer_id).await?)
    }
}
