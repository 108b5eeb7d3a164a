//! Input types accepted by the services.

use domain::{AddressFields, CustomerId, Money, ProductId};
use serde::{Deserialize, Serialize};

/// One requested line of a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Request to place an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrder {
    pub customer_id: CustomerId,
    pub items: Vec<RequestedItem>,
}

impl CreateOrder {
    pub fn new(customer_id: CustomerId, items: Vec<RequestedItem>) -> Self {
        Self { customer_id, items }
    }

    /// Builds a request from `(product, quantity)` pairs.
    pub fn with_items(
        customer_id: CustomerId,
        items: impl IntoIterator<Item = (ProductId, u32)>,
    ) -> Self {
        Self {
            customer_id,
            items: items
                .into_iter()
                .map(|(product_id, quantity)| RequestedItem {
                    product_id,
                    quantity,
                })
                .collect(),
        }
    }
}

/// Request to register a customer together with its address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub address: AddressFields,
}

/// Request to add a product to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    /// Price in cents.
    pub price: Money,
    pub stock: u32,
}
