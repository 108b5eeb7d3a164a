//! Application services for the store backend.
//!
//! Each service is generic over a [`store::Store`] and runs every operation
//! inside a single transaction: either all of its writes are committed or
//! none are.
//!
//! - [`OrderService`]: order placement, status changes and cancellation
//! - [`CustomerService`]: customers and their address
//! - [`CatalogService`]: products, categories and stock levels
//! - [`ReportService`]: read-only aggregates

pub mod catalog;
pub mod commands;
pub mod customers;
pub mod error;
pub mod orders;
pub mod reports;

pub use catalog::CatalogService;
pub use commands::{CreateOrder, NewCustomer, NewProduct, RequestedItem};
pub use customers::CustomerService;
pub use error::{ErrorKind, Result, ServiceError};
pub use orders::OrderService;
pub use reports::ReportService;
