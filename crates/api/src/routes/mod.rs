//! Route handlers, one module per resource.

pub mod categories;
pub mod customers;
pub mod health;
pub mod index;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod reports;

use domain::Money;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;

/// Parses a path segment into a typed id, answering 400 when it is not a UUID.
pub(crate) fn parse_id<T: From<Uuid>>(raw: &str) -> Result<T, ApiError> {
    let uuid = Uuid::parse_str(raw.trim())
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(T::from(uuid))
}

/// Money as both a display string and exact cents.
#[derive(Debug, Serialize)]
pub struct AmountResponse {
    pub amount: String,
    pub cents: i64,
}

impl From<Money> for AmountResponse {
    fn from(money: Money) -> Self {
        Self {
            amount: money.to_string(),
            cents: money.cents(),
        }
    }
}
