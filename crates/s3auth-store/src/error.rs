//! Typed store failures.

use thiserror::Error;

/// A failure surfaced by any store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested row does not exist (or is tombstoned and treated as gone).
    #[error("not found: {0}")]
    NotFound(String),
    /// A unique constraint was violated — duplicate username, tenant name, or access key id.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// A non-uniqueness constraint was violated (e.g. an invariant check failed).
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    /// Any other storage-layer failure. Callers do not retry.
    #[error("store error: {0}")]
    StoreError(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return StoreError::AlreadyExists(db_err.message().to_owned());
        }
        if matches!(err, sqlx::Error::RowNotFound) {
            return StoreError::NotFound("row not found".to_owned());
        }
        StoreError::StoreError(err.to_string())
    }
}

impl From<StoreError> for s3auth_core::AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => s3auth_core::AuthError::StoreError(msg),
            StoreError::AlreadyExists(msg) => s3auth_core::AuthError::AlreadyExists(msg),
            StoreError::ConstraintViolation(msg) => s3auth_core::AuthError::ConstraintViolation(msg),
            StoreError::StoreError(msg) => s3auth_core::AuthError::StoreError(msg),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_display_not_found_message() {
        let err = StoreError::NotFound("user:1".to_owned());
        assert_eq!(err.to_string(), "not found: user:1");
    }
}
