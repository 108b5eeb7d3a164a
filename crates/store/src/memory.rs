use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    Address, Category, CategoryId, CategorySummary, Customer, CustomerId, CustomerTotal,
    CustomerWithAddress, LineItem, Money, Order, OrderDetails, OrderId, OrderStatus, Product,
    ProductId,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Page, PageRequest, Result, StoreError,
    store::{CategoryStore, CustomerStore, LineItemStore, OrderStore, ProductStore, Store, Transaction},
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    customers: HashMap<CustomerId, Customer>,
    /// Keyed by owning customer; at most one address each.
    addresses: HashMap<CustomerId, Address>,
    products: HashMap<ProductId, Product>,
    categories: HashMap<CategoryId, Category>,
    orders: HashMap<OrderId, Order>,
}

impl MemoryState {
    fn with_address(&self, customer: &Customer) -> CustomerWithAddress {
        CustomerWithAddress {
            customer: customer.clone(),
            address: self.addresses.get(&customer.id()).cloned(),
        }
    }

    fn customers_where(&self, keep: impl Fn(&CustomerWithAddress) -> bool) -> Vec<CustomerWithAddress> {
        let mut rows: Vec<_> = self
            .customers
            .values()
            .map(|c| self.with_address(c))
            .filter(|row| keep(row))
            .collect();
        rows.sort_by(|a, b| {
            a.customer
                .name()
                .cmp(b.customer.name())
                .then(a.customer.id().cmp(&b.customer.id()))
        });
        rows
    }

    fn sorted_products(&self, keep: impl Fn(&Product) -> bool) -> Vec<Product> {
        let mut products: Vec<_> = self.products.values().filter(|p| keep(p)).cloned().collect();
        products.sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
        products
    }
}

/// In-memory storage backend.
///
/// A transaction holds the store's single lock for its whole lifetime and
/// works on a private copy of the data, so transactions are fully serialized
/// and an uncommitted one leaves no trace.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTransaction { guard, working })
    }
}

/// A transaction against [`InMemoryStore`].
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(self) -> Result<()> {
        let MemoryTransaction { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl CustomerStore for MemoryTransaction {
    async fn get_customer(&mut self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.working.customers.get(&id).cloned())
    }

    async fn get_customer_by_email(&mut self, email: &str) -> Result<Option<Customer>> {
        Ok(self
            .working
            .customers
            .values()
            .find(|c| c.email() == email)
            .cloned())
    }

    async fn customer_exists_by_email(&mut self, email: &str) -> Result<bool> {
        Ok(self.get_customer_by_email(email).await?.is_some())
    }

    async fn save_customer(&mut self, customer: &Customer) -> Result<()> {
        let taken = self
            .working
            .customers
            .values()
            .any(|c| c.email() == customer.email() && c.id() != customer.id());
        if taken {
            return Err(StoreError::unique("customers_email_key"));
        }
        self.working.customers.insert(customer.id(), customer.clone());
        Ok(())
    }

    async fn delete_customer(&mut self, id: CustomerId) -> Result<bool> {
        if self.working.customers.remove(&id).is_none() {
            return Ok(false);
        }
        self.working.addresses.remove(&id);
        self.working.orders.retain(|_, order| order.customer_id() != id);
        Ok(true)
    }

    async fn list_customers(&mut self) -> Result<Vec<CustomerWithAddress>> {
        Ok(self.working.customers_where(|_| true))
    }

    async fn list_customers_by_city(&mut self, city: &str) -> Result<Vec<CustomerWithAddress>> {
        Ok(self
            .working
            .customers_where(|row| row.address.as_ref().is_some_and(|a| a.city() == city)))
    }

    async fn get_address(&mut self, customer_id: CustomerId) -> Result<Option<Address>> {
        Ok(self.working.addresses.get(&customer_id).cloned())
    }

    async fn save_address(&mut self, address: &Address) -> Result<()> {
        if let Some(existing) = self.working.addresses.get(&address.customer_id())
            && existing.id() != address.id()
        {
            return Err(StoreError::unique("addresses_customer_id_key"));
        }
        self.working
            .addresses
            .insert(address.customer_id(), address.clone());
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryTransaction {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn get_product_for_update(&mut self, id: ProductId) -> Result<Option<Product>> {
        // The whole store is already locked by this transaction.
        self.get_product(id).await
    }

    async fn product_exists_by_name(&mut self, name: &str) -> Result<bool> {
        Ok(self.working.products.values().any(|p| p.name() == name))
    }

    async fn save_product(&mut self, product: &Product) -> Result<()> {
        let taken = self
            .working
            .products
            .values()
            .any(|p| p.name() == product.name() && p.id() != product.id());
        if taken {
            return Err(StoreError::unique("products_name_key"));
        }
        self.working.products.insert(product.id(), product.clone());
        Ok(())
    }

    async fn list_products(&mut self) -> Result<Vec<Product>> {
        Ok(self.working.sorted_products(|_| true))
    }

    async fn list_products_by_category(
        &mut self,
        category_id: CategoryId,
        page: PageRequest,
    ) -> Result<Page<Product>> {
        let all = self.working.sorted_products(|p| p.in_category(category_id));
        Ok(Page::slice(all, page))
    }

    async fn list_products_with_stock_below(&mut self, threshold: u32) -> Result<Vec<Product>> {
        let mut products = self.working.sorted_products(|p| p.stock() < threshold);
        products.sort_by_key(Product::stock);
        Ok(products)
    }
}

#[async_trait]
impl CategoryStore for MemoryTransaction {
    async fn get_category_by_name(&mut self, name: &str) -> Result<Option<Category>> {
        Ok(self
            .working
            .categories
            .values()
            .find(|c| c.name() == name)
            .cloned())
    }

    async fn save_category(&mut self, category: &Category) -> Result<()> {
        let taken = self
            .working
            .categories
            .values()
            .any(|c| c.name() == category.name() && c.id() != category.id());
        if taken {
            return Err(StoreError::unique("categories_name_key"));
        }
        self.working
            .categories
            .insert(category.id(), category.clone());
        Ok(())
    }

    async fn list_categories(&mut self) -> Result<Vec<CategorySummary>> {
        let mut rows: Vec<_> = self
            .working
            .categories
            .values()
            .map(|category| CategorySummary {
                category: category.clone(),
                product_count: self
                    .working
                    .products
                    .values()
                    .filter(|p| p.in_category(category.id()))
                    .count() as u64,
            })
            .collect();
        rows.sort_by(|a, b| a.category.name().cmp(b.category.name()));
        Ok(rows)
    }
}

#[async_trait]
impl OrderStore for MemoryTransaction {
    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn get_order_with_items(&mut self, id: OrderId) -> Result<Option<OrderDetails>> {
        let Some(order) = self.working.orders.get(&id).cloned() else {
            return Ok(None);
        };
        let products = order
            .items()
            .iter()
            .map(|item| {
                self.working
                    .products
                    .get(&item.product_id())
                    .cloned()
                    .ok_or_else(|| {
                        StoreError::corrupt(
                            "line_items",
                            format!("product {} is missing", item.product_id()),
                        )
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(OrderDetails { order, products }))
    }

    async fn save_order(&mut self, order: &Order) -> Result<()> {
        self.working.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn list_orders_by_customer(&mut self, customer_id: CustomerId) -> Result<Vec<Order>> {
        let mut orders: Vec<_> = self
            .working
            .orders
            .values()
            .filter(|o| o.customer_id() == customer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }

    async fn totals_by_customer(&mut self) -> Result<Vec<CustomerTotal>> {
        let mut spent: HashMap<CustomerId, Money> = HashMap::new();
        for order in self.working.orders.values() {
            if order.status() != OrderStatus::Cancelled {
                *spent.entry(order.customer_id()).or_default() += order.total();
            }
        }

        let mut rows: Vec<_> = self
            .working
            .customers
            .values()
            .map(|c| CustomerTotal {
                customer_id: c.id(),
                customer_name: c.name().to_string(),
                total: spent.get(&c.id()).copied().unwrap_or_default(),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.customer_name.cmp(&b.customer_name))
        });
        Ok(rows)
    }
}

#[async_trait]
impl LineItemStore for MemoryTransaction {
    async fn line_item_exists(&mut self, order_id: OrderId, product_id: ProductId) -> Result<bool> {
        Ok(self
            .working
            .orders
            .get(&order_id)
            .is_some_and(|o| o.contains_product(product_id)))
    }

    async fn list_line_items(&mut self, order_id: OrderId) -> Result<Vec<LineItem>> {
        Ok(self
            .working
            .orders
            .get(&order_id)
            .map(|o| o.items().to_vec())
            .unwrap_or_default())
    }
}
