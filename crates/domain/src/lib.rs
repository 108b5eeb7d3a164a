//! Domain layer for the store backend.
//!
//! This crate holds the passive entity model and the rules that keep it
//! consistent:
//! - Customers and their single postal address
//! - Products with the inventory rules (stock checks, decrement, increment)
//! - Categories linked to products
//! - Orders with line items, historical unit pricing and a status machine
//!
//! Nothing here performs I/O; persistence lives in the `store` crate.

pub mod customer;
pub mod error;
pub mod order;
pub mod product;
pub mod report;
pub mod value_objects;

pub use common::{AddressId, CategoryId, CustomerId, LineItemId, OrderId, ProductId};
pub use customer::{Address, AddressFields, Customer, CustomerWithAddress};
pub use error::{DomainError, Result};
pub use order::{LineItem, Order, OrderDetails, OrderStatus, StockReversal};
pub use product::{Category, CategorySummary, Product};
pub use report::CustomerTotal;
pub use value_objects::Money;
