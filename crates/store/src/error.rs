use thiserror::Error;

/// Errors that can occur when talking to a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key already exists (email, product name, category name...).
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A stored row could not be turned back into an entity.
    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub(crate) fn unique(constraint: impl Into<String>) -> Self {
        StoreError::UniqueViolation {
            constraint: constraint.into(),
        }
    }

    pub(crate) fn corrupt(table: &'static str, reason: impl Into<String>) -> Self {
        StoreError::CorruptRow {
            table,
            reason: reason.into(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return StoreError::unique(db_err.constraint().unwrap_or("unknown"));
        }
        StoreError::Database(err)
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
