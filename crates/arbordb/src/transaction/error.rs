//! Transaction error types.

use arbordb_storage::StorageError;
use thiserror::Error;

/// Errors that can occur during transaction operations.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// A storage-level error occurred.
    #[error("storage error: {0}")]
    Storage(String),

    /// A write was attempted on a read-only transaction.
    #[error("write attempted on read-only transaction")]
    ReadOnly,

    /// The transaction was already committed or rolled back.
    #[error("transaction already completed")]
    AlreadyCompleted,

    /// The transaction conflicted with a concurrent writer and must be
    /// retried.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// A serialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An internal error occurred.
    #[error("internal transaction error: {0}")]
    Internal(String),
}

impl From<StorageError> for TransactionError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ReadOnly => Self::ReadOnly,
            StorageError::Conflict(msg) => Self::Conflict(msg),
            StorageError::Serialization(msg) => Self::Serialization(msg),
            other => Self::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_conflicts_stay_conflicts() {
        let err = TransactionError::from(StorageError::Conflict("busy".to_owned()));
        assert!(matches!(err, TransactionError::Conflict(_)));

        let err = TransactionError::from(StorageError::ReadOnly);
        assert!(matches!(err, TransactionError::ReadOnly));

        let err = TransactionError::from(StorageError::Open("nope".to_owned()));
        assert!(matches!(err, TransactionError::Storage(_)));
    }
}
