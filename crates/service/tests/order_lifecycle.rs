//! Integration tests for the order lifecycle.
//!
//! These run the services against the in-memory store and check the stock
//! and order invariants after every step.

use std::sync::Arc;

use domain::{AddressFields, CustomerId, Money, OrderStatus, ProductId};
use service::{
    CatalogService, CreateOrder, CustomerService, ErrorKind, NewCustomer, NewProduct,
    OrderService, ReportService,
};
use store::InMemoryStore;

struct Fixture {
    orders: OrderService<InMemoryStore>,
    catalog: CatalogService<InMemoryStore>,
    customers: CustomerService<InMemoryStore>,
    reports: ReportService<InMemoryStore>,
}

fn fixture() -> Fixture {
    let store = InMemoryStore::new();
    Fixture {
        orders: OrderService::new(store.clone()),
        catalog: CatalogService::new(store.clone()),
        customers: CustomerService::new(store.clone()),
        reports: ReportService::new(store),
    }
}

impl Fixture {
    async fn customer(&self, name: &str) -> CustomerId {
        self.customers
            .create_customer(NewCustomer {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                address: AddressFields {
                    street: "Main St 1".to_string(),
                    city: "Madrid".to_string(),
                    country: "Spain".to_string(),
                    postal_code: "28001".to_string(),
                },
            })
            .await
            .unwrap()
            .customer
            .id()
    }

    async fn product(&self, name: &str, price_cents: i64, stock: u32) -> ProductId {
        self.catalog
            .create_product(NewProduct {
                name: name.to_string(),
                price: Money::from_cents(price_cents),
                stock,
            })
            .await
            .unwrap()
            .id()
    }

    async fn stock(&self, product_id: ProductId) -> u32 {
        self.catalog.get_product(product_id).await.unwrap().stock()
    }
}

mod order_lifecycle {
    use super::*;

    #[tokio::test]
    async fn place_then_cancel_restores_stock() {
        let f = fixture();
        let customer = f.customer("Ana").await;
        let p = f.product("P", 1000, 5).await;

        let order = f
            .orders
            .create_order(CreateOrder::with_items(customer, [(p, 3)]))
            .await
            .unwrap();
        assert_eq!(order.total(), Money::from_cents(3000));
        assert_eq!(order.total().to_string(), "30.00");
        assert_eq!(f.stock(p).await, 2);

        let cancelled = f.orders.cancel_order(order.id()).await.unwrap();
        assert_eq!(cancelled.status(), OrderStatus::Cancelled);
        assert_eq!(f.stock(p).await, 5);
    }

    #[tokio::test]
    async fn full_happy_path() {
        let f = fixture();
        let customer = f.customer("Ana").await;
        let a = f.product("A", 1000, 10).await;
        let b = f.product("B", 250, 10).await;

        let order = f
            .orders
            .create_order(CreateOrder::with_items(customer, [(a, 2), (b, 4)]))
            .await
            .unwrap();

        let paid = f
            .orders
            .change_status(order.id(), OrderStatus::Paid)
            .await
            .unwrap();
        assert_eq!(paid.status(), OrderStatus::Paid);

        let shipped = f
            .orders
            .change_status(order.id(), OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(shipped.status(), OrderStatus::Shipped);

        let details = f.orders.find_order_with_items(order.id()).await.unwrap();
        assert_eq!(details.order.status(), OrderStatus::Shipped);
        assert_eq!(details.order.total(), Money::from_cents(3000));
        let lines: Vec<_> = details
            .lines()
            .map(|(item, product)| (product.name().to_string(), item.quantity()))
            .collect();
        assert_eq!(lines, vec![("A".to_string(), 2), ("B".to_string(), 4)]);
    }

    #[tokio::test]
    async fn cancel_paid_order() {
        let f = fixture();
        let customer = f.customer("Ana").await;
        let p = f.product("P", 500, 8).await;
        let order = f
            .orders
            .create_order(CreateOrder::with_items(customer, [(p, 8)]))
            .await
            .unwrap();
        assert_eq!(f.stock(p).await, 0);

        f.orders
            .change_status(order.id(), OrderStatus::Paid)
            .await
            .unwrap();
        f.orders.cancel_order(order.id()).await.unwrap();

        assert_eq!(f.stock(p).await, 8);
    }

    #[tokio::test]
    async fn terminal_orders_cannot_be_cancelled() {
        let f = fixture();
        let customer = f.customer("Ana").await;
        let p = f.product("P", 500, 8).await;
        let order = f
            .orders
            .create_order(CreateOrder::with_items(customer, [(p, 2)]))
            .await
            .unwrap();
        f.orders
            .change_status(order.id(), OrderStatus::Paid)
            .await
            .unwrap();
        f.orders
            .change_status(order.id(), OrderStatus::Shipped)
            .await
            .unwrap();

        let err = f.orders.cancel_order(order.id()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(f.stock(p).await, 6);

        let other = f
            .orders
            .create_order(CreateOrder::with_items(customer, [(p, 1)]))
            .await
            .unwrap();
        f.orders.cancel_order(other.id()).await.unwrap();
        let err = f.orders.cancel_order(other.id()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        // A second cancel must not hand the stock back twice.
        assert_eq!(f.stock(p).await, 6);
    }

    #[tokio::test]
    async fn customer_orders_newest_first() {
        let f = fixture();
        let customer = f.customer("Ana").await;
        let p = f.product("P", 100, 10).await;

        let first = f
            .orders
            .create_order(CreateOrder::with_items(customer, [(p, 1)]))
            .await
            .unwrap();
        let second = f
            .orders
            .create_order(CreateOrder::with_items(customer, [(p, 2)]))
            .await
            .unwrap();

        let listed = f.orders.list_orders_for_customer(customer).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|o| o.id()).collect();
        assert_eq!(ids.len(), 2);
        if first.created_at() != second.created_at() {
            assert_eq!(ids, vec![second.id(), first.id()]);
        }

        let err = f
            .orders
            .list_orders_for_customer(CustomerId::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}

mod transitions {
    use super::*;

    #[tokio::test]
    async fn invalid_transitions_are_rejected() {
        let f = fixture();
        let customer = f.customer("Ana").await;
        let p = f.product("P", 100, 10).await;
        let order = f
            .orders
            .create_order(CreateOrder::with_items(customer, [(p, 1)]))
            .await
            .unwrap();

        for target in [OrderStatus::New, OrderStatus::Shipped] {
            let err = f
                .orders
                .change_status(order.id(), target)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTransition, "NEW -> {target}");
        }

        f.orders
            .change_status(order.id(), OrderStatus::Cancelled)
            .await
            .unwrap();
        for target in OrderStatus::ALL {
            let err = f
                .orders
                .change_status(order.id(), target)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTransition, "CANCELLED -> {target}");
        }
        assert_eq!(f.stock(p).await, 10);
    }
}

mod inventory {
    use super::*;

    #[tokio::test]
    async fn insufficient_stock_changes_nothing() {
        let f = fixture();
        let customer = f.customer("Ana").await;
        let p = f.product("P", 100, 2).await;

        let err = f
            .orders
            .create_order(CreateOrder::with_items(customer, [(p, 5)]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("Insufficient stock"));
        assert_eq!(f.stock(p).await, 2);
        assert!(f.orders.list_orders_for_customer(customer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_on_later_item_rolls_back_earlier_ones() {
        let f = fixture();
        let customer = f.customer("Ana").await;
        let a = f.product("A", 100, 10).await;
        let b = f.product("B", 100, 1).await;

        let err = f
            .orders
            .create_order(CreateOrder::with_items(customer, [(a, 4), (b, 2)]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(f.stock(a).await, 10);
        assert_eq!(f.stock(b).await, 1);
    }

    #[tokio::test]
    async fn same_product_twice_is_rejected() {
        let f = fixture();
        let customer = f.customer("Ana").await;
        let p = f.product("P", 100, 10).await;

        let err = f
            .orders
            .create_order(CreateOrder::with_items(customer, [(p, 1), (p, 2)]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(f.stock(p).await, 10);
        assert!(f.orders.list_orders_for_customer(customer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn crossing_orders_both_complete() {
        let f = Arc::new(fixture());
        let customer = f.customer("Ana").await;
        let a = f.product("A", 100, 10).await;
        let b = f.product("B", 100, 10).await;

        let mut handles = Vec::new();
        for items in [[(a, 1), (b, 2)], [(b, 3), (a, 4)]] {
            let f = Arc::clone(&f);
            handles.push(tokio::spawn(async move {
                f.orders
                    .create_order(CreateOrder::with_items(customer, items))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(f.stock(a).await, 5);
        assert_eq!(f.stock(b).await, 5);

        // Lines keep the requested order even though rows are locked by id.
        let orders = f.orders.list_orders_for_customer(customer).await.unwrap();
        for order in orders {
            let first = order.items()[0].quantity();
            assert!(first == 1 || first == 3);
        }
    }

    #[tokio::test]
    async fn concurrent_orders_never_oversell() {
        let f = Arc::new(fixture());
        let customer = f.customer("Ana").await;
        let p = f.product("P", 100, 10).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let f = Arc::clone(&f);
            handles.push(tokio::spawn(async move {
                f.orders
                    .create_order(CreateOrder::with_items(customer, [(p, 3)]))
                    .await
                    .is_ok()
            }));
        }

        let mut placed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                placed += 1;
            }
        }

        assert_eq!(placed, 3);
        assert_eq!(f.stock(p).await, 1);
    }
}

mod reports {
    use super::*;

    #[tokio::test]
    async fn totals_exclude_cancelled_and_include_zero() {
        let f = fixture();
        let ana = f.customer("Ana").await;
        let bob = f.customer("Bob").await;
        let _cid = f.customer("Cid").await;
        let p = f.product("P", 1000, 100).await;

        f.orders
            .create_order(CreateOrder::with_items(ana, [(p, 2)]))
            .await
            .unwrap();
        let cancelled = f
            .orders
            .create_order(CreateOrder::with_items(ana, [(p, 5)]))
            .await
            .unwrap();
        f.orders.cancel_order(cancelled.id()).await.unwrap();
        f.orders
            .create_order(CreateOrder::with_items(bob, [(p, 3)]))
            .await
            .unwrap();

        let totals: Vec<_> = f
            .reports
            .totals_by_customer()
            .await
            .unwrap()
            .into_iter()
            .map(|t| (t.customer_name, t.total.cents()))
            .collect();

        assert_eq!(
            totals,
            vec![
                ("Bob".to_string(), 3000),
                ("Ana".to_string(), 2000),
                ("Cid".to_string(), 0),
            ]
        );
    }

    #[tokio::test]
    async fn low_stock_report() {
        let f = fixture();
        let customer = f.customer("Ana").await;
        let p = f.product("P", 100, 12).await;
        f.product("Q", 100, 50).await;

        assert!(f.reports.low_stock(10).await.unwrap().is_empty());

        f.orders
            .create_order(CreateOrder::with_items(customer, [(p, 5)]))
            .await
            .unwrap();

        let low = f.reports.low_stock(10).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id(), p);
        assert_eq!(low[0].stock(), 7);
    }
}
