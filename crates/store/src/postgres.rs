use std::collections::HashMap;

use async_trait::async_trait;
use domain::{
    Address, AddressFields, AddressId, Category, CategoryId, CategorySummary, Customer,
    CustomerId, CustomerTotal, CustomerWithAddress, LineItem, LineItemId, Money, Order,
    OrderDetails, OrderId, OrderStatus, Product, ProductId,
};
use sqlx::{PgPool, Postgres, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Page, PageRequest, Result, StoreError,
    store::{CategoryStore, CustomerStore, LineItemStore, OrderStore, ProductStore, Store, Transaction},
};

const CUSTOMER_WITH_ADDRESS: &str = r#"
    SELECT c.id, c.name, c.email,
           a.id AS address_id, a.street, a.city, a.country, a.postal_code
    FROM customers c
    LEFT JOIN addresses a ON a.customer_id = c.id
"#;

const ORDER_COLUMNS: &str = "id, customer_id, created_at, status";

const LINE_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price_cents";

/// Builds a product select with category ids aggregated into an array.
fn product_query(filter: &str, order_by: &str) -> String {
    format!(
        r#"
        SELECT p.id, p.name, p.price_cents, p.stock,
               COALESCE(
                   array_agg(pc.category_id) FILTER (WHERE pc.category_id IS NOT NULL),
                   '{{}}'::uuid[]
               ) AS category_ids
        FROM products p
        LEFT JOIN product_categories pc ON pc.product_id = p.id
        {filter}
        GROUP BY p.id
        {order_by}
        "#
    )
}

fn to_u32(table: &'static str, column: &str, value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::corrupt(table, format!("{column} out of range: {value}")))
}

fn customer_from_row(row: &PgRow) -> Result<Customer> {
    Ok(Customer::restore(
        CustomerId::from_uuid(row.try_get::<Uuid, _>("id")?),
        row.try_get("name")?,
        row.try_get("email")?,
    ))
}

/// Maps a `CUSTOMER_WITH_ADDRESS` row.
fn customer_with_address_from_row(row: &PgRow) -> Result<CustomerWithAddress> {
    let customer = customer_from_row(row)?;
    let address = match row.try_get::<Option<Uuid>, _>("address_id")? {
        Some(address_id) => Some(Address::restore(
            AddressId::from_uuid(address_id),
            customer.id(),
            AddressFields {
                street: row.try_get("street")?,
                city: row.try_get("city")?,
                country: row.try_get("country")?,
                postal_code: row.try_get("postal_code")?,
            },
        )),
        None => None,
    };
    Ok(CustomerWithAddress { customer, address })
}

fn address_from_row(row: &PgRow) -> Result<Address> {
    Ok(Address::restore(
        AddressId::from_uuid(row.try_get::<Uuid, _>("id")?),
        CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
        AddressFields {
            street: row.try_get("street")?,
            city: row.try_get("city")?,
            country: row.try_get("country")?,
            postal_code: row.try_get("postal_code")?,
        },
    ))
}

fn product_from_row(row: &PgRow) -> Result<Product> {
    let category_ids: Vec<Uuid> = row.try_get("category_ids")?;
    Ok(Product::restore(
        ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        row.try_get("name")?,
        Money::from_cents(row.try_get("price_cents")?),
        to_u32("products", "stock", row.try_get("stock")?)?,
        category_ids.into_iter().map(CategoryId::from_uuid),
    ))
}

fn line_item_from_row(row: &PgRow) -> Result<LineItem> {
    Ok(LineItem::restore(
        LineItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
        OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        to_u32("line_items", "quantity", row.try_get("quantity")?)?,
        Money::from_cents(row.try_get("unit_price_cents")?),
    ))
}

fn order_from_row(row: &PgRow, items: Vec<LineItem>) -> Result<Order> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| StoreError::corrupt("orders", e.to_string()))?;
    Ok(Order::restore(
        OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
        row.try_get("created_at")?,
        status,
        items,
    ))
}

/// PostgreSQL-backed storage.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresTransaction;

    async fn begin(&self) -> Result<PostgresTransaction> {
        Ok(PostgresTransaction {
            tx: self.pool.begin().await?,
        })
    }
}

/// A transaction against [`PostgresStore`]. Rolled back on drop unless
/// committed.
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl PostgresTransaction {
    /// Loads the items of several orders at once, grouped by order.
    async fn items_for_orders(&mut self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<LineItem>>> {
        let rows = sqlx::query(&format!(
            "SELECT {LINE_ITEM_COLUMNS} FROM line_items WHERE order_id = ANY($1) ORDER BY order_id, position"
        ))
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<LineItem>> = HashMap::new();
        for row in &rows {
            let item = line_item_from_row(row)?;
            grouped
                .entry(item.order_id().as_uuid())
                .or_default()
                .push(item);
        }
        Ok(grouped)
    }

    async fn products_by_ids(&mut self, ids: &[Uuid]) -> Result<Vec<Product>> {
        let rows = sqlx::query(&product_query("WHERE p.id = ANY($1)", ""))
            .bind(ids)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(product_from_row).collect()
    }
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CustomerStore for PostgresTransaction {
    async fn get_customer(&mut self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT id, name, email FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn get_customer_by_email(&mut self, email: &str) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT id, name, email FROM customers WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn customer_exists_by_email(&mut self, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customers WHERE email = $1)")
                .bind(email)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn save_customer(&mut self, customer: &Customer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email
            "#,
        )
        .bind(customer.id().as_uuid())
        .bind(customer.name())
        .bind(customer.email())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_customer(&mut self, id: CustomerId) -> Result<bool> {
        // Address, orders and line items go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_customers(&mut self) -> Result<Vec<CustomerWithAddress>> {
        let rows = sqlx::query(&format!("{CUSTOMER_WITH_ADDRESS} ORDER BY c.name, c.id"))
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(customer_with_address_from_row).collect()
    }

    async fn list_customers_by_city(&mut self, city: &str) -> Result<Vec<CustomerWithAddress>> {
        let rows = sqlx::query(&format!(
            "{CUSTOMER_WITH_ADDRESS} WHERE a.city = $1 ORDER BY c.name, c.id"
        ))
        .bind(city)
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter().map(customer_with_address_from_row).collect()
    }

    async fn get_address(&mut self, customer_id: CustomerId) -> Result<Option<Address>> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_id, street, city, country, postal_code
            FROM addresses
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(address_from_row).transpose()
    }

    async fn save_address(&mut self, address: &Address) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO addresses (id, customer_id, street, city, country, postal_code)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                street = EXCLUDED.street,
                city = EXCLUDED.city,
                country = EXCLUDED.country,
                postal_code = EXCLUDED.postal_code
            "#,
        )
        .bind(address.id().as_uuid())
        .bind(address.customer_id().as_uuid())
        .bind(address.street())
        .bind(address.city())
        .bind(address.country())
        .bind(address.postal_code())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for PostgresTransaction {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&product_query("WHERE p.id = $1", ""))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn get_product_for_update(&mut self, id: ProductId) -> Result<Option<Product>> {
        // FOR UPDATE cannot be combined with GROUP BY, so lock first.
        let locked = sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        if locked.is_none() {
            return Ok(None);
        }
        self.get_product(id).await
    }

    async fn product_exists_by_name(&mut self, name: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE name = $1)")
                .bind(name)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn save_product(&mut self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                price_cents = EXCLUDED.price_cents,
                stock = EXCLUDED.stock
            "#,
        )
        .bind(product.id().as_uuid())
        .bind(product.name())
        .bind(product.price().cents())
        .bind(i64::from(product.stock()))
        .execute(&mut *self.tx)
        .await?;

        sqlx::query("DELETE FROM product_categories WHERE product_id = $1")
            .bind(product.id().as_uuid())
            .execute(&mut *self.tx)
            .await?;

        let category_ids: Vec<Uuid> = product.category_ids().map(Uuid::from).collect();
        if !category_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO product_categories (product_id, category_id)
                SELECT $1, UNNEST($2::uuid[])
                "#,
            )
            .bind(product.id().as_uuid())
            .bind(&category_ids)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn list_products(&mut self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&product_query("", "ORDER BY p.name, p.id"))
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(product_from_row).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn list_products_by_category(
        &mut self,
        category_id: CategoryId,
        page: PageRequest,
    ) -> Result<Page<Product>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM product_categories WHERE category_id = $1")
                .bind(category_id.as_uuid())
                .fetch_one(&mut *self.tx)
                .await?;

        let rows = sqlx::query(&product_query(
            "WHERE p.id IN (SELECT product_id FROM product_categories WHERE category_id = $1)",
            "ORDER BY p.name, p.id LIMIT $2 OFFSET $3",
        ))
        .bind(category_id.as_uuid())
        .bind(i64::from(page.size()))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(Page {
            items: rows.iter().map(product_from_row).collect::<Result<_>>()?,
            page: page.page(),
            size: page.size(),
            total_items: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn list_products_with_stock_below(&mut self, threshold: u32) -> Result<Vec<Product>> {
        let rows = sqlx::query(&product_query(
            "WHERE p.stock < $1",
            "ORDER BY p.stock, p.name, p.id",
        ))
        .bind(i64::from(threshold))
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter().map(product_from_row).collect()
    }
}

#[async_trait]
impl CategoryStore for PostgresTransaction {
    async fn get_category_by_name(&mut self, name: &str) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(|row| -> Result<Category> {
            Ok(Category::restore(
                CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
                row.try_get("name")?,
            ))
        })
        .transpose()
    }

    async fn save_category(&mut self, category: &Category) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(category.id().as_uuid())
        .bind(category.name())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn list_categories(&mut self) -> Result<Vec<CategorySummary>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.name, COUNT(pc.product_id) AS product_count
            FROM categories c
            LEFT JOIN product_categories pc ON pc.category_id = c.id
            GROUP BY c.id, c.name
            ORDER BY c.name
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter()
            .map(|row| -> Result<CategorySummary> {
                let count: i64 = row.try_get("product_count")?;
                Ok(CategorySummary {
                    category: Category::restore(
                        CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
                        row.try_get("name")?,
                    ),
                    product_count: u64::try_from(count).unwrap_or_default(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl OrderStore for PostgresTransaction {
    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.list_line_items(id).await?;
        order_from_row(&row, items).map(Some)
    }

    async fn get_order_with_items(&mut self, id: OrderId) -> Result<Option<OrderDetails>> {
        let Some(order) = self.get_order(id).await? else {
            return Ok(None);
        };

        let ids: Vec<Uuid> = order
            .items()
            .iter()
            .map(|item| Uuid::from(item.product_id()))
            .collect();
        let mut by_id: HashMap<ProductId, Product> = self
            .products_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id(), p))
            .collect();

        let products = order
            .items()
            .iter()
            .map(|item| {
                by_id.remove(&item.product_id()).ok_or_else(|| {
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
        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, created_at, status, total_cents)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                total_cents = EXCLUDED.total_cents
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.customer_id().as_uuid())
        .bind(order.created_at())
        .bind(order.status().as_str())
        .bind(order.total().cents())
        .execute(&mut *self.tx)
        .await?;

        sqlx::query("DELETE FROM line_items WHERE order_id = $1")
            .bind(order.id().as_uuid())
            .execute(&mut *self.tx)
            .await?;

        for (position, item) in order.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO line_items (id, order_id, product_id, position, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item.id().as_uuid())
            .bind(item.order_id().as_uuid())
            .bind(item.product_id().as_uuid())
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .bind(i64::from(item.quantity()))
            .bind(item.unit_price().cents())
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn list_orders_by_customer(&mut self, customer_id: CustomerId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 ORDER BY created_at DESC, id"
        ))
        .bind(customer_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;

        let ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<_, _>>()?;
        let mut items = self.items_for_orders(&ids).await?;

        rows.iter()
            .zip(&ids)
            .map(|(row, id)| order_from_row(row, items.remove(id).unwrap_or_default()))
            .collect()
    }

    #[tracing::instrument(skip(self))]
    async fn totals_by_customer(&mut self) -> Result<Vec<CustomerTotal>> {
        // SUM over BIGINT yields NUMERIC, which can exceed the BIGINT range.
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.name,
                   LEAST(
                       COALESCE(SUM(o.total_cents) FILTER (WHERE o.status <> 'CANCELLED'), 0),
                       9223372036854775807
                   )::BIGINT AS total_cents
            FROM customers c
            LEFT JOIN orders o ON o.customer_id = c.id
            GROUP BY c.id, c.name
            ORDER BY total_cents DESC, c.name ASC
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter()
            .map(|row| -> Result<CustomerTotal> {
                Ok(CustomerTotal {
                    customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("id")?),
                    customer_name: row.try_get("name")?,
                    total: Money::from_cents(row.try_get("total_cents")?),
                })
            })
            .collect()
    }
}

#[async_trait]
impl LineItemStore for PostgresTransaction {
    async fn line_item_exists(&mut self, order_id: OrderId, product_id: ProductId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM line_items WHERE order_id = $1 AND product_id = $2)",
        )
        .bind(order_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn list_line_items(&mut self, order_id: OrderId) -> Result<Vec<LineItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {LINE_ITEM_COLUMNS} FROM line_items WHERE order_id = $1 ORDER BY position"
        ))
        .bind(order_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter().map(line_item_from_row).collect()
    }
}
