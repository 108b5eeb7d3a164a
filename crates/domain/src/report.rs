//! Read-only report rows.

use common::CustomerId;
use serde::{Deserialize, Serialize};

use crate::value_objects::Money;

/// Lifetime spend of one customer, excluding cancelled orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerTotal {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub total: Money,
}
