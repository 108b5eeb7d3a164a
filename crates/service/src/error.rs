//! Service error types.

use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Coarse classification of a failure, used for HTTP status codes and
/// metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    ValidationFailed,
    Conflict,
    InvalidTransition,
    InvalidState,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A unique key is already taken.
    #[error("{0}")]
    Conflict(String),

    /// A domain rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl ServiceError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Returns the kind of failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NotFound { .. } => ErrorKind::NotFound,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::Domain(err) => match err {
                DomainError::Validation { .. } => ErrorKind::ValidationFailed,
                DomainError::InsufficientStock { .. } | DomainError::DuplicateProduct { .. } => {
                    ErrorKind::Conflict
                }
                DomainError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
                DomainError::NotCancellable { .. } => ErrorKind::InvalidState,
            },
            ServiceError::Store(_) => ErrorKind::Internal,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { constraint } => {
                ServiceError::Conflict(format!("Duplicate value violates {constraint}"))
            }
            other => ServiceError::Store(other),
        }
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{OrderStatus, ProductId};

    #[test]
    fn test_domain_errors_map_to_kinds() {
        let cases = [
            (DomainError::validation("quantity", "zero"), ErrorKind::ValidationFailed),
            (
                DomainError::DuplicateProduct {
                    product_id: ProductId::new(),
                },
                ErrorKind::Conflict,
            ),
            (
                DomainError::InvalidTransition {
                    from: OrderStatus::New,
                    to: OrderStatus::Shipped,
                },
                ErrorKind::InvalidTransition,
            ),
            (
                DomainError::NotCancellable {
                    status: OrderStatus::Shipped,
                },
                ErrorKind::InvalidState,
            ),
        ];

        for (err, kind) in cases {
            assert_eq!(ServiceError::from(err).kind(), kind);
        }
    }

    #[test]
    fn test_unique_violation_becomes_conflict() {
        let err = ServiceError::from(StoreError::UniqueViolation {
            constraint: "products_name_key".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("products_name_key"));
    }

    #[test]
    fn test_not_found_message() {
        let err = ServiceError::not_found("customer", "42");
        assert_eq!(err.to_string(), "customer not found: 42");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
