//! Products, categories and stock levels.

use domain::{Category, CategorySummary, Product, ProductId};
use store::{CategoryStore, Page, PageRequest, ProductStore, Store, Transaction};

use crate::commands::NewProduct;
use crate::error::{Result, ServiceError};

/// Service for the product catalog.
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, cmd), fields(name = %cmd.name))]
    pub async fn create_product(&self, cmd: NewProduct) -> Result<Product> {
        let product = Product::new(cmd.name, cmd.price, cmd.stock)?;

        let mut tx = self.store.begin().await?;
        if tx.product_exists_by_name(product.name()).await? {
            return Err(ServiceError::Conflict(format!(
                "Product {} already exists",
                product.name()
            )));
        }
        tx.save_product(&product).await?;
        tx.commit().await?;

        tracing::info!(product_id = %product.id(), "product created");
        Ok(product)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        let mut tx = self.store.begin().await?;
        tx.get_product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_products().await?)
    }

    /// Links the product to each named category, creating missing ones.
    ///
    /// Links that already exist are left alone.
    #[tracing::instrument(skip(self))]
    pub async fn assign_categories(&self, product_id: ProductId, names: &[String]) -> Result<Product> {
        let mut tx = self.store.begin().await?;
        let mut product = tx
            .get_product_for_update(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", product_id))?;

        for name in names {
            let category = match tx.get_category_by_name(name.trim()).await? {
                Some(category) => category,
                None => {
                    let category = Category::new(name.as_str())?;
                    tx.save_category(&category).await?;
                    tracing::debug!(category = category.name(), "category created");
                    category
                }
            };
            product.add_category(category.id());
        }

        tx.save_product(&product).await?;
        tx.commit().await?;
        Ok(product)
    }

    /// Returns one page of the products in a category, ordered by name.
    #[tracing::instrument(skip(self))]
    pub async fn products_by_category(&self, name: &str, page: PageRequest) -> Result<Page<Product>> {
        let mut tx = self.store.begin().await?;
        let category = tx
            .get_category_by_name(name.trim())
            .await?
            .ok_or_else(|| ServiceError::not_found("category", name))?;
        Ok(tx.list_products_by_category(category.id(), page).await?)
    }

    /// Overwrites a product's stock level.
    #[tracing::instrument(skip(self))]
    pub async fn update_stock(&self, product_id: ProductId, stock: u32) -> Result<Product> {
        let mut tx = self.store.begin().await?;
        let mut product = tx
            .get_product_for_update(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", product_id))?;

        let previous = product.stock();
        product.set_stock(stock);
        tx.save_product(&product).await?;
        tx.commit().await?;

        tracing::info!(%product_id, previous, stock, "stock updated");
        Ok(product)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategorySummary>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_categories().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use domain::Money;
    use store::InMemoryStore;

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price: Money::from_cents(1999),
            stock: 3,
        }
    }

    #[tokio::test]
    async fn test_duplicate_product_name_conflicts() {
        let service = CatalogService::new(InMemoryStore::new());
        service.create_product(new_product("Mug")).await.unwrap();

        let err = service.create_product(new_product("Mug")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_non_positive_price_is_rejected() {
        let service = CatalogService::new(InMemoryStore::new());
        let mut cmd = new_product("Mug");
        cmd.price = Money::zero();

        let err = service.create_product(cmd).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }

    #[tokio::test]
    async fn test_price_above_maximum_is_rejected() {
        let service = CatalogService::new(InMemoryStore::new());
        let mut cmd = new_product("Mug");
        cmd.price = Money::from_cents(i64::MAX / 2);

        let err = service.create_product(cmd).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert!(service.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assign_categories_creates_and_reuses() {
        let service = CatalogService::new(InMemoryStore::new());
        let mug = service.create_product(new_product("Mug")).await.unwrap();
        let cup = service.create_product(new_product("Cup")).await.unwrap();

        let names = vec!["Kitchen".to_string(), "Gifts".to_string()];
        let mug = service.assign_categories(mug.id(), &names).await.unwrap();
        assert_eq!(mug.category_ids().count(), 2);

        // Assigning again is idempotent.
        let mug = service.assign_categories(mug.id(), &names).await.unwrap();
        assert_eq!(mug.category_ids().count(), 2);

        service
            .assign_categories(cup.id(), &["Kitchen".to_string()])
            .await
            .unwrap();

        let counts: Vec<_> = service
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|s| (s.category.name().to_string(), s.product_count))
            .collect();
        assert_eq!(
            counts,
            vec![("Gifts".to_string(), 1), ("Kitchen".to_string(), 2)]
        );

        let page = service
            .products_by_category("Kitchen", PageRequest::first())
            .await
            .unwrap();
        let names: Vec<_> = page.items.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Cup", "Mug"]);
    }

    #[tokio::test]
    async fn test_unknown_category() {
        let service = CatalogService::new(InMemoryStore::new());
        let err = service
            .products_by_category("Nope", PageRequest::first())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_stock() {
        let service = CatalogService::new(InMemoryStore::new());
        let mug = service.create_product(new_product("Mug")).await.unwrap();

        let updated = service.update_stock(mug.id(), 42).await.unwrap();
        assert_eq!(updated.stock(), 42);
        assert_eq!(service.get_product(mug.id()).await.unwrap().stock(), 42);
    }
}
