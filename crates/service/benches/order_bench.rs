use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Customer, Money, Product, ProductId};
use service::{CreateOrder, OrderService};
use store::{CustomerStore, InMemoryStore, ProductStore, Store, Transaction};

/// Seeds a customer and `count` well-stocked products.
async fn seed(store: &InMemoryStore, count: usize) -> (domain::CustomerId, Vec<ProductId>) {
    let customer = Customer::new("Bench", "bench@example.com").unwrap();
    let mut tx = store.begin().await.unwrap();
    tx.save_customer(&customer).await.unwrap();

    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let product =
            Product::new(format!("Item {i}"), Money::from_cents(999), u32::MAX).unwrap();
        tx.save_product(&product).await.unwrap();
        ids.push(product.id());
    }
    tx.commit().await.unwrap();
    (customer.id(), ids)
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let (customer_id, products) = rt.block_on(seed(&store, 1));
    let service = OrderService::new(store);

    c.bench_function("service/create_order_1_item", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .create_order(CreateOrder::with_items(customer_id, [(products[0], 1)]))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_create_order_10_items(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let (customer_id, products) = rt.block_on(seed(&store, 10));
    let service = OrderService::new(store);

    c.bench_function("service/create_order_10_items", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cmd = CreateOrder::with_items(customer_id, products.iter().map(|&p| (p, 1)));
                service.create_order(cmd).await.unwrap();
            });
        });
    });
}

fn bench_place_and_cancel(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let (customer_id, products) = rt.block_on(seed(&store, 3));
    let service = OrderService::new(store);

    c.bench_function("service/place_and_cancel", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cmd = CreateOrder::with_items(customer_id, products.iter().map(|&p| (p, 2)));
                let order = service.create_order(cmd).await.unwrap();
                service.cancel_order(order.id()).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_create_order,
    bench_create_order_10_items,
    bench_place_and_cancel,
);
criterion_main!(benches);
