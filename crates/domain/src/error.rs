//! Domain error types.

use common::ProductId;
use thiserror::Error;

use crate::order::OrderStatus;

/// Errors raised by entity constructors and invariant-preserving mutators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A required field is missing or malformed.
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// A stock decrement would take the product below zero.
    #[error(
        "Insufficient stock for {product_name}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        available: u32,
        requested: u32,
    },

    /// The product already has a line item on this order.
    #[error("Product {product_id} is already in the order")]
    DuplicateProduct { product_id: ProductId },

    /// The requested status change is not in the transition table.
    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Cancellation was requested for an order that is no longer cancellable.
    #[error("Order in status {status} cannot be cancelled")]
    NotCancellable { status: OrderStatus },
}

impl DomainError {
    /// Builds a [`DomainError::Validation`].
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        DomainError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
