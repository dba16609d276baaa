//! Error types for `ArborDB`.
//!
//! This module provides the umbrella [`enum@Error`] that all lower-layer
//! errors convert into at the facade boundary.

use thiserror::Error;

use crate::io::ImportError;
use crate::rebrand::RebrandError;
use crate::transaction::TransactionError;

/// Errors that can occur when using `ArborDB`.
#[derive(Debug, Error)]
pub enum Error {
    /// The database could not be opened.
    #[error("failed to open database: {0}")]
    Open(String),

    /// A core validation or encoding error occurred.
    #[error(transparent)]
    Core(#[from] arbordb_core::CoreError),

    /// A graph or registry operation failed.
    #[error(transparent)]
    Graph(#[from] arbordb_graph::GraphError),

    /// A query filter was malformed or failed to evaluate.
    #[error(transparent)]
    Filter(#[from] arbordb_query::FilterError),

    /// A storage backend error occurred.
    #[error("storage error: {0}")]
    Storage(#[from] arbordb_storage::StorageError),

    /// A transaction error occurred.
    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    /// A rebrand migration failed.
    #[error(transparent)]
    Rebrand(#[from] RebrandError),

    /// A JSON import failed.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// No entity matched when exactly one was required.
    #[error("not found: {0}")]
    NotFound(String),

    /// More than one entity matched when exactly one was required.
    #[error("ambiguous result: {0}")]
    AmbiguousResult(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is a concurrency conflict that can be retried.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Transaction(TransactionError::Conflict(_))
                | Self::Storage(arbordb_storage::StorageError::Conflict(_))
        )
    }
}

/// Result type for `ArborDB` operations.
pub type Result<T> = std::result::Result<T, Error>;
