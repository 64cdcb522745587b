use thiserror::Error;

/// Errors raised by the persistence collaborators
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Write rejected because of conflicting state (duplicate key, stale row)
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// A single store call exceeded its deadline
    #[error("Store operation timed out: {operation}")]
    Timeout { operation: String },

    /// The store cannot be reached at all
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure scoped to one call
    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Infrastructure failures abort the whole batch instead of one element
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
