//! Catalog products, categories, and the inventory rules.

use std::collections::BTreeSet;

use common::{CategoryId, ProductId};
use serde::Serialize;

use crate::error::{DomainError, Result};
use crate::value_objects::{Money, require_not_blank};

/// A sellable product.
///
/// Stock only changes through [`Product::decrement_stock`],
/// [`Product::increment_stock`] and [`Product::set_stock`]; being unsigned it
/// can never go negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    id: ProductId,
    name: String,
    price: Money,
    stock: u32,
    /// Owning side of the product/category link.
    category_ids: BTreeSet<CategoryId>,
}

impl Product {
    /// Highest accepted price: ten digits with two decimals, 99,999,999.99.
    pub const MAX_PRICE: Money = Money::from_cents(9_999_999_999);

    /// Creates a product with no categories.
    pub fn new(name: impl Into<String>, price: Money, stock: u32) -> Result<Self> {
        let name = require_not_blank("name", name)?;
        if !price.is_positive() {
            return Err(DomainError::validation(
                "price",
                format!("{price} must be greater than zero"),
            ));
        }
        if price > Self::MAX_PRICE {
            return Err(DomainError::validation(
                "price",
                format!("{price} exceeds the maximum of {}", Self::MAX_PRICE),
            ));
        }

        Ok(Self {
            id: ProductId::new(),
            name,
            price,
            stock,
            category_ids: BTreeSet::new(),
        })
    }

    /// Rebuilds a product from persisted fields.
    pub fn restore(
        id: ProductId,
        name: String,
        price: Money,
        stock: u32,
        category_ids: impl IntoIterator<Item = CategoryId>,
    ) -> Self {
        Self {
            id,
            name,
            price,
            stock,
            category_ids: category_ids.into_iter().collect(),
        }
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// Returns the ids of the linked categories in a stable order.
    pub fn category_ids(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.category_ids.iter().copied()
    }

    pub fn in_category(&self, category_id: CategoryId) -> bool {
        self.category_ids.contains(&category_id)
    }

    /// Links a category. Returns false if it was already linked.
    pub fn add_category(&mut self, category_id: CategoryId) -> bool {
        self.category_ids.insert(category_id)
    }

    /// Returns true if `quantity` units can be taken from stock.
    pub fn has_sufficient_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }

    /// Takes `quantity` units out of stock.
    pub fn decrement_stock(&mut self, quantity: u32) -> Result<()> {
        if !self.has_sufficient_stock(quantity) {
            return Err(DomainError::InsufficientStock {
                product_id: self.id,
                product_name: self.name.clone(),
                available: self.stock,
                requested: quantity,
            });
        }
        self.stock -= quantity;
        Ok(())
    }

    /// Puts `quantity` units back into stock.
    pub fn increment_stock(&mut self, quantity: u32) {
        self.stock = self.stock.saturating_add(quantity);
    }

    /// Overwrites the stock level, e.g. after a physical count.
    pub fn set_stock(&mut self, stock: u32) {
        self.stock = stock;
    }
}

/// A named product grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    id: CategoryId,
    name: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            id: CategoryId::new(),
            name: require_not_blank("category name", name)?,
        })
    }

    pub fn restore(id: CategoryId, name: String) -> Self {
        Self { id, name }
    }

    pub fn id(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A category with the number of products linked to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub product_count: u64,
}
