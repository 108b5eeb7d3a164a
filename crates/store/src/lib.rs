//! Persistence for the store backend.
//!
//! Every read and write goes through a [`Transaction`] obtained from a
//! [`Store`]. Changes become visible on [`Transaction::commit`]; dropping a
//! transaction without committing discards them.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, MemoryTransaction};
pub use postgres::{PostgresStore, PostgresTransaction};
pub use query::{Page, PageRequest};
pub use store::{
    CategoryStore, CustomerStore, LineItemStore, OrderStore, ProductStore, Store, Transaction,
};
