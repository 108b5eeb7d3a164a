use async_trait::async_trait;
use domain::{
    Address, Category, CategoryId, CategorySummary, Customer, CustomerId, CustomerTotal,
    CustomerWithAddress, LineItem, Order, OrderDetails, OrderId, Product, ProductId,
};

use crate::{Page, PageRequest, Result};

/// Customers and their addresses.
#[async_trait]
pub trait CustomerStore {
    async fn get_customer(&mut self, id: CustomerId) -> Result<Option<Customer>>;

    /// Looks a customer up by exact (already normalized) email.
    async fn get_customer_by_email(&mut self, email: &str) -> Result<Option<Customer>>;

    async fn customer_exists_by_email(&mut self, email: &str) -> Result<bool>;

    /// Inserts or updates a customer.
    ///
    /// Fails with `UniqueViolation` if another customer has the same email.
    async fn save_customer(&mut self, customer: &Customer) -> Result<()>;

    /// Deletes a customer together with its address, orders and line items.
    ///
    /// Returns false if the customer did not exist.
    async fn delete_customer(&mut self, id: CustomerId) -> Result<bool>;

    /// Returns every customer with its address attached, ordered by name.
    async fn list_customers(&mut self) -> Result<Vec<CustomerWithAddress>>;

    /// Returns the customers whose address is in `city`, ordered by name.
    async fn list_customers_by_city(&mut self, city: &str) -> Result<Vec<CustomerWithAddress>>;

    async fn get_address(&mut self, customer_id: CustomerId) -> Result<Option<Address>>;

    /// Inserts or updates the address of its customer.
    async fn save_address(&mut self, address: &Address) -> Result<()>;
}

/// Catalog products.
#[async_trait]
pub trait ProductStore {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Reads a product that is about to be modified.
    ///
    /// Backends with row locking hold the row until the transaction ends.
    async fn get_product_for_update(&mut self, id: ProductId) -> Result<Option<Product>>;

    async fn product_exists_by_name(&mut self, name: &str) -> Result<bool>;

    /// Inserts or updates a product and replaces its category links.
    async fn save_product(&mut self, product: &Product) -> Result<()>;

    /// Returns every product ordered by name.
    async fn list_products(&mut self) -> Result<Vec<Product>>;

    /// Returns one page of the products linked to a category, ordered by name.
    async fn list_products_by_category(
        &mut self,
        category_id: CategoryId,
        page: PageRequest,
    ) -> Result<Page<Product>>;

    /// Returns products with `stock < threshold`, lowest stock first.
    async fn list_products_with_stock_below(&mut self, threshold: u32) -> Result<Vec<Product>>;
}

/// Product categories.
#[async_trait]
pub trait CategoryStore {
    async fn get_category_by_name(&mut self, name: &str) -> Result<Option<Category>>;

    async fn save_category(&mut self, category: &Category) -> Result<()>;

    /// Returns every category with its product count, ordered by name.
    async fn list_categories(&mut self) -> Result<Vec<CategorySummary>>;
}

/// Orders and the customer-spend aggregate.
#[async_trait]
pub trait OrderStore {
    /// Loads an order with its line items.
    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>>;

    /// Loads an order with its line items and the products they refer to.
    async fn get_order_with_items(&mut self, id: OrderId) -> Result<Option<OrderDetails>>;

    /// Inserts or updates an order and replaces its line items.
    async fn save_order(&mut self, order: &Order) -> Result<()>;

    /// Returns a customer's orders, newest first.
    async fn list_orders_by_customer(&mut self, customer_id: CustomerId) -> Result<Vec<Order>>;

    /// Sums non-cancelled order totals per customer.
    ///
    /// Every customer appears, with zero if nothing qualifies. Ordered by
    /// total descending, then name ascending.
    async fn totals_by_customer(&mut self) -> Result<Vec<CustomerTotal>>;
}

/// Direct access to persisted line items.
#[async_trait]
pub trait LineItemStore {
    async fn line_item_exists(&mut self, order_id: OrderId, product_id: ProductId) -> Result<bool>;

    async fn list_line_items(&mut self, order_id: OrderId) -> Result<Vec<LineItem>>;
}

/// A unit of work over every repository.
///
/// Dropping a transaction without calling [`Transaction::commit`] rolls it
/// back.
#[async_trait]
pub trait Transaction:
    CustomerStore + ProductStore + CategoryStore + OrderStore + LineItemStore + Send
{
    /// Makes every change done through this transaction visible.
    async fn commit(self) -> Result<()>;
}

/// Core trait for storage backends.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    type Tx: Transaction;

    /// Starts a new transaction.
    async fn begin(&self) -> Result<Self::Tx>;
}
